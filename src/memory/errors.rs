//! Error types for the memory gateways.

use thiserror::Error;

/// Memory gateway error type.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] rig::embeddings::EmbeddingError),
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// HTTP request to the vector index failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The vector index answered with a non-success status.
    #[error("vector index returned http status {status}: {body}")]
    HttpStatus {
        /// Status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The embedding does not match the index dimensionality.
    #[error("embedding has {actual} dimensions, index expects {expected}")]
    Dimensions {
        /// Configured dimensionality.
        expected: usize,
        /// Dimensionality returned by the model.
        actual: usize,
    },
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenience result alias for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
