//! Error types for document upload, extraction, and storage.

use thiserror::Error;

/// Document subsystem error type.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The upload carried no file part.
    #[error("No file uploaded")]
    NoFile,
    /// The file part had an empty file name.
    #[error("No file selected")]
    NoFileSelected,
    /// Extraction produced no text.
    #[error("No readable text found in the file.")]
    NoReadableText,
    /// The PDF could not be parsed.
    #[error("pdf extraction failed: {0}")]
    Pdf(String),
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Whether the error comes from the request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoFile | Self::NoFileSelected | Self::NoReadableText | Self::Pdf(_)
        )
    }
}

/// Convenience result alias for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;
