//! Per-user document slot.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;

use crate::documents::errors::DocumentResult;

/// Boxed future type for document store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Holds the most recently uploaded document text of each user.
///
/// Implementations replace a user's slot atomically: readers see either the
/// previous document or the new one, never a mix.
pub trait DocumentStore: Send + Sync {
    /// Replace the user's document.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn put<'a>(&'a self, user_id: &'a str, text: String) -> StoreFuture<'a, DocumentResult<()>>;

    /// Current document of the user, if any.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, DocumentResult<Option<Arc<str>>>>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Document store held in process memory.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    slots: DashMap<String, Arc<str>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a stored document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no user has a stored document.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn put<'a>(&'a self, user_id: &'a str, text: String) -> StoreFuture<'a, DocumentResult<()>> {
        Box::pin(async move {
            self.slots.insert(user_id.to_string(), Arc::from(text));
            Ok(())
        })
    }

    fn get<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, DocumentResult<Option<Arc<str>>>> {
        Box::pin(async move { Ok(self.slots.get(user_id).map(|slot| Arc::clone(slot.value()))) })
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryDocumentStore::new();
        assert!(store.get("jotiba").await.unwrap().is_none());

        store.put("jotiba", "first".to_string()).await.unwrap();
        assert_eq!(store.get("jotiba").await.unwrap().as_deref(), Some("first"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = InMemoryDocumentStore::new();
        store.put("jotiba", "first".to_string()).await.unwrap();
        store.put("jotiba", "second".to_string()).await.unwrap();
        assert_eq!(store.get("jotiba").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = InMemoryDocumentStore::new();
        store.put("alice", "a".to_string()).await.unwrap();
        assert!(store.get("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reader_keeps_previous_snapshot() {
        let store = InMemoryDocumentStore::new();
        store.put("u", "old".to_string()).await.unwrap();
        let snapshot = store.get("u").await.unwrap().unwrap();
        store.put("u", "new".to_string()).await.unwrap();
        assert_eq!(&*snapshot, "old");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_replacement_never_tears() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let docs: Vec<String> = (0..8).map(|i| format!("{i}").repeat(1_000)).collect();

        let mut handles = Vec::new();
        for doc in docs.clone() {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    store.put("u", doc.clone()).await.unwrap();
                    let seen = store.get("u").await.unwrap().unwrap();
                    let first = seen.chars().next().unwrap();
                    assert!(seen.chars().all(|c| c == first));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let last = store.get("u").await.unwrap().unwrap();
        assert!(docs.iter().any(|doc| doc.as_str() == &*last));
    }
}
