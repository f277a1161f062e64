//! Uploaded documents: extraction and per-user storage.

pub mod errors;
pub mod extract;
pub mod sqlite_store;
pub mod store;

use std::sync::Arc;

use tracing::info;

pub use errors::{DocumentError, DocumentResult};
pub use extract::{DocumentKind, extract_text, sanitize_file_name, save_upload};
pub use sqlite_store::SqliteDocumentStore;
pub use store::{DocumentStore, InMemoryDocumentStore, StoreFuture};

use crate::config::DocumentConfig;

/// Build the document store selected by config.
///
/// # Errors
/// Returns an error if the `SQLite` database cannot be opened.
pub async fn build_store(config: &DocumentConfig) -> DocumentResult<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match &config.sqlite_path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            Arc::new(SqliteDocumentStore::open(path).await?)
        }
        None => Arc::new(InMemoryDocumentStore::new()),
    };
    info!("Document store: {}", store.name());
    Ok(store)
}
