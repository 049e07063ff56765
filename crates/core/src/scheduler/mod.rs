//! Periodic cache refresh.
//!
//! [`RefreshScheduler`] pulls the full guide from an [`EpgSource`](crate::upstream::EpgSource)
//! on a fixed interval, replaces the store contents and rebuilds the search
//! index. At most one refresh runs at a time; overlapping requests are
//! dropped, not queued.

mod runner;
mod types;

pub use runner::RefreshScheduler;
pub use types::{RefreshError, RefreshOutcome};

use chrono::{DateTime, Utc};

/// Refresh state and manual triggering, as seen by the query layer.
pub trait RefreshControl: Send + Sync {
    fn is_refreshing(&self) -> bool;

    /// When the next scheduled refresh is due. `None` when the schedule is
    /// not running.
    fn next_refresh_time(&self) -> Option<DateTime<Utc>>;

    /// Start a refresh in the background.
    ///
    /// Returns `false` without doing anything if a refresh is already in
    /// progress.
    fn trigger_refresh(&self) -> bool;
}
