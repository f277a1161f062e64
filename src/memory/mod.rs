//! Long-term memory of past interactions.
//!
//! - `gateway`: the [`MemoryGateway`] contract and [`InteractionRecord`]
//! - `embedding`: embedding model abstraction and Ollama implementation
//! - `pinecone`: gateway over a hosted Pinecone index
//! - `in_memory`: process-local gateway for development and tests

pub mod embedding;
pub mod errors;
pub mod gateway;
pub mod in_memory;
pub mod pinecone;

use std::sync::Arc;

use tracing::{info, warn};

pub use embedding::{EmbedFuture, Embedder, OllamaEmbedder};
pub use errors::{MemoryError, MemoryResult};
pub use gateway::{InteractionRecord, MemoryFuture, MemoryGateway};
pub use in_memory::InMemoryMemory;
pub use pinecone::PineconeMemory;

use crate::config::MemoryConfig;

/// Build the memory gateway selected by config.
///
/// Pinecone is used when both its key and index host are set; otherwise the
/// in-process gateway.
///
/// # Errors
/// Returns an error if the Pinecone gateway or its embedder cannot be built.
pub fn build_gateway(config: &MemoryConfig) -> MemoryResult<Arc<dyn MemoryGateway>> {
    if config.pinecone_enabled() {
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(config)?);
        let gateway = PineconeMemory::new(config, embedder)?;
        info!("Long-term memory: Pinecone ({})", config.embedding_model);
        return Ok(Arc::new(gateway));
    }

    if config.pinecone_api_key.is_some() || config.pinecone_index_host.is_some() {
        warn!("Pinecone needs both PINECONE_API_KEY and PINECONE_INDEX_HOST; using in-process memory");
    } else {
        info!("Long-term memory: in-process");
    }
    Ok(Arc::new(InMemoryMemory::new(config.in_memory_capacity)))
}
