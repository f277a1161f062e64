//! Application state shared across all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::assistant::Assistant;
use crate::config::AppConfig;
use crate::documents::build_store;
use crate::llm::OllamaGenerator;
use crate::memory::build_gateway;

/// Shared application state.
pub struct AppState {
    /// The assistant answering chat and upload requests.
    pub assistant: Assistant,
    /// Directory served at `/`.
    pub static_dir: PathBuf,
    /// Request body limit applied to the router.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wrap an already-built assistant.
    #[must_use]
    pub fn new(config: &AppConfig, assistant: Assistant) -> Arc<Self> {
        Arc::new(Self {
            assistant,
            static_dir: config.server.static_dir.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }

    /// Build the production collaborators selected by `config`.
    ///
    /// The Ollama readiness check only logs; a missing backend surfaces later
    /// as a fallback reply.
    ///
    /// # Errors
    /// Returns an error if a store, gateway or client cannot be created.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Arc<Self>> {
        let documents = build_store(&config.documents)
            .await
            .context("failed to open document store")?;
        let memory = build_gateway(&config.memory).context("failed to build memory gateway")?;
        let generator = OllamaGenerator::new(&config.generation)
            .context("failed to create Ollama client")?;

        info!(
            "Ollama endpoint: {} (model {})",
            config.generation.base_url,
            generator.model()
        );
        if generator.is_ready().await {
            let warm = generator.clone();
            tokio::spawn(async move {
                match warm.preload().await {
                    Ok(()) => info!("Model {} preloaded", warm.model()),
                    Err(e) => warn!("Model preload failed: {e}"),
                }
            });
        } else {
            warn!("Ollama is not reachable yet; chat will answer with a fallback until it is");
        }

        let assistant = Assistant::new(config, documents, memory, Arc::new(generator));
        Ok(Self::new(config, assistant))
    }
}
