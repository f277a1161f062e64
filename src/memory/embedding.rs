//! Embedding model wrapper for Rig + Ollama.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client as ReqwestClient;
use rig::client::{EmbeddingsClient, Nothing};
use rig::embeddings::{Embedding, EmbeddingModel};
use rig::providers::ollama;

use crate::config::MemoryConfig;
use crate::memory::errors::{MemoryError, MemoryResult};

/// Boxed future type for embedder operations.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstraction over embedding models.
pub trait Embedder: Send + Sync {
    /// Embed a single text string.
    ///
    /// # Errors
    /// Returns an error if the embedding request fails.
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, MemoryResult<Embedding>>;
    /// Return embedding dimensionality.
    fn ndims(&self) -> usize;
}

type OllamaEmbeddingModel = ollama::EmbeddingModel<ReqwestClient>;

/// Ollama embedder using Rig provider.
#[derive(Clone)]
pub struct OllamaEmbedder {
    model: OllamaEmbeddingModel,
    ndims: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder from config.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn new(config: &MemoryConfig) -> MemoryResult<Self> {
        let builder = ollama::Client::<ReqwestClient>::builder().api_key(Nothing);
        let builder = if let Some(base_url) = &config.embedding_base_url {
            builder.base_url(base_url)
        } else {
            builder
        };
        let client = builder.build().map_err(MemoryError::from)?;
        let model =
            client.embedding_model_with_ndims(config.embedding_model.clone(), config.embedding_ndims);
        Ok(Self {
            model,
            ndims: config.embedding_ndims,
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, MemoryResult<Embedding>> {
        let text = text.to_string();
        Box::pin(async move {
            self.model
                .embed_text(&text)
                .await
                .map_err(MemoryError::Embedding)
        })
    }

    fn ndims(&self) -> usize {
        self.ndims
    }
}

/// Convert an embedding to the `f32` values vector indexes expect, checking
/// its dimensionality.
///
/// # Errors
/// Returns [`MemoryError::Dimensions`] when the length does not match.
#[allow(clippy::cast_possible_truncation)]
pub fn to_f32_values(embedding: &Embedding, expected: usize) -> MemoryResult<Vec<f32>> {
    if embedding.vec.len() != expected {
        return Err(MemoryError::Dimensions {
            expected,
            actual: embedding.vec.len(),
        });
    }
    Ok(embedding.vec.iter().map(|v| *v as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_f32_values() {
        let embedding = Embedding {
            document: "hello".to_string(),
            vec: vec![0.5, -0.25, 1.0],
        };
        assert_eq!(to_f32_values(&embedding, 3).unwrap(), vec![0.5_f32, -0.25, 1.0]);
    }

    #[test]
    fn test_to_f32_values_rejects_wrong_dims() {
        let embedding = Embedding {
            document: "hello".to_string(),
            vec: vec![0.5; 4],
        };
        assert!(matches!(
            to_f32_values(&embedding, 384),
            Err(MemoryError::Dimensions {
                expected: 384,
                actual: 4
            })
        ));
    }
}
