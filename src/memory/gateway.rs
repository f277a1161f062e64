//! Memory gateway contract and the interaction record it stores.

use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::memory::errors::MemoryResult;

/// Boxed future type for memory gateway operations.
pub type MemoryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Long-term memory of past interactions, queried by similarity.
///
/// Callers treat both operations as best-effort: a failed write is logged and
/// dropped, a failed query counts as "no matches".
pub trait MemoryGateway: Send + Sync {
    /// Persist one (message, response) pair for a user.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the write.
    fn write<'a>(
        &'a self,
        user_id: &'a str,
        message: &'a str,
        response: &'a str,
    ) -> MemoryFuture<'a, MemoryResult<()>>;

    /// Up to `top_k` stored texts most similar to `text`, best first.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be queried.
    fn query<'a>(
        &'a self,
        user_id: &'a str,
        text: &'a str,
        top_k: usize,
    ) -> MemoryFuture<'a, MemoryResult<Vec<String>>>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// One stored exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionRecord {
    /// Owner of the exchange.
    pub user_id: String,
    /// User message, or an event tag such as `document_upload`.
    pub message: String,
    /// Assistant response, or the event payload.
    pub response: String,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

impl InteractionRecord {
    /// Record stamped with the current time.
    #[must_use]
    pub fn new(user_id: &str, message: &str, response: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            message: message.to_string(),
            response: response.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Text that gets embedded and returned by queries.
    #[must_use]
    pub fn text(&self) -> String {
        format!("User: {}\nAI: {}", self.message, self.response)
    }

    /// Stable identifier: the same user and text always map to the same id.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}-{}", self.user_id, hash_content(&self.text()))
    }
}

/// Compute a stable hash for content.
#[must_use]
pub fn hash_content(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let value = hasher.finish();
    format!("{value:016x}")
}
