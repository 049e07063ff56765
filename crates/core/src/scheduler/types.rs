//! Types for the refresh scheduler.

use thiserror::Error;

use crate::store::StoreError;
use crate::upstream::UpstreamError;

/// Result of a single refresh attempt.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The store and index now hold the fetched data.
    Completed { events: usize, channels: usize },
    /// Another refresh was already running.
    Skipped,
    /// The cycle stopped at the first error and the sync status went back to idle.
    Failed(RefreshError),
}

impl RefreshOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RefreshOutcome::Completed { .. })
    }
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
