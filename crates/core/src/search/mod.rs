//! Fuzzy full-text search over cached events.
//!
//! [`SearchIndex`] holds an immutable index snapshot behind a lock. A rebuild
//! constructs a complete new snapshot first and then swaps it in, so a
//! concurrent search sees either the old index or the new one, never a mix.

mod index;

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::info;

use crate::store::{EpgStore, StoreError};

use index::InvertedIndex;

/// Results returned when the caller does not ask for a limit.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// An event id with its relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEventId {
    pub event_id: i64,
    pub score: f64,
}

/// Swap-on-rebuild search index.
#[derive(Debug, Default)]
pub struct SearchIndex {
    active: RwLock<Arc<InvertedIndex>>,
}

impl SearchIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index with one built from the store's current events.
    ///
    /// Returns the number of indexed documents. On error the previous
    /// index stays active.
    pub fn rebuild(&self, store: &dyn EpgStore) -> Result<usize, StoreError> {
        let documents = store.get_all_events_for_indexing()?;
        let index = Arc::new(InvertedIndex::build(&documents));
        let count = index.document_count();

        *self.active.write().unwrap_or_else(|e| e.into_inner()) = index;

        info!(documents = count, "Search index rebuilt");
        Ok(count)
    }

    /// Search titles, subtitles, summaries and descriptions.
    ///
    /// Returns at most `limit` results, best first. Blank or unmatched
    /// queries return an empty list.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredEventId> {
        self.snapshot()
            .search(query, limit)
            .into_iter()
            .map(|(event_id, score)| ScoredEventId { event_id, score })
            .collect()
    }

    /// Number of documents in the active index.
    pub fn document_count(&self) -> usize {
        self.snapshot().document_count()
    }

    fn snapshot(&self) -> Arc<InvertedIndex> {
        Arc::clone(&self.active.read().unwrap_or_else(|e| e.into_inner()))
    }
}
