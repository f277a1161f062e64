//! In-process memory gateway.
//!
//! Used when no vector index is configured and in tests. Similarity is plain
//! word overlap between the query and the stored text; ties go to the newest
//! record. Each user keeps at most `capacity` records, oldest dropped first.

use std::collections::{HashSet, VecDeque};

use dashmap::DashMap;

use crate::memory::errors::MemoryResult;
use crate::memory::gateway::{InteractionRecord, MemoryFuture, MemoryGateway};

/// Memory gateway held in process memory.
pub struct InMemoryMemory {
    records: DashMap<String, VecDeque<InteractionRecord>>,
    capacity: usize,
}

impl InMemoryMemory {
    /// Create an empty gateway keeping `capacity` records per user.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Number of records stored for a user.
    #[must_use]
    pub fn len_for(&self, user_id: &str) -> usize {
        self.records.get(user_id).map_or(0, |records| records.len())
    }

    fn search(&self, user_id: &str, text: &str, top_k: usize) -> Vec<String> {
        let Some(records) = self.records.get(user_id) else {
            return Vec::new();
        };

        let query = word_set(text);
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f64, usize, String)> = records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                let stored = record.text();
                let score = overlap(&query, &word_set(&stored));
                (score > 0.0).then_some((score, idx, stored))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));
        scored.into_iter().take(top_k).map(|(_, _, text)| text).collect()
    }
}

impl MemoryGateway for InMemoryMemory {
    fn write<'a>(
        &'a self,
        user_id: &'a str,
        message: &'a str,
        response: &'a str,
    ) -> MemoryFuture<'a, MemoryResult<()>> {
        Box::pin(async move {
            let record = InteractionRecord::new(user_id, message, response);
            let mut entry = self.records.entry(user_id.to_string()).or_default();
            entry.retain(|existing| existing.id() != record.id());
            while entry.len() >= self.capacity {
                entry.pop_front();
            }
            entry.push_back(record);
            Ok(())
        })
    }

    fn query<'a>(
        &'a self,
        user_id: &'a str,
        text: &'a str,
        top_k: usize,
    ) -> MemoryFuture<'a, MemoryResult<Vec<String>>> {
        Box::pin(async move { Ok(self.search(user_id, text, top_k)) })
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

fn word_set(text: &str) -> HashSet<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| word.len() > 1)
        .map(str::to_lowercase)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn overlap(query: &HashSet<String>, stored: &HashSet<String>) -> f64 {
    let shared = query.intersection(stored).count();
    if shared == 0 {
        return 0.0;
    }
    shared as f64 / query.union(stored).count() as f64
}
