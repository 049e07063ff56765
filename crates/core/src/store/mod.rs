//! Local projection of the program guide.
//!
//! The store holds the latest complete pull of events and channels and the
//! singleton sync record describing cache freshness. Every refresh replaces
//! the event and channel sets wholesale.

mod sqlite;
mod types;

pub use sqlite::SqliteEpgStore;
pub use types::*;

use crate::upstream::{Channel, EpgEvent};

/// Trait for program guide storage.
pub trait EpgStore: Send + Sync {
    /// Delete all events and insert the given set in one transaction.
    ///
    /// Duplicate event ids fail the whole replace.
    fn replace_all_events(&self, events: &[EpgEvent]) -> Result<(), StoreError>;

    /// Delete all channels and insert the given set in one transaction.
    fn replace_all_channels(&self, channels: &[Channel]) -> Result<(), StoreError>;

    /// Events overlapping `[start, stop)`, ordered by start time.
    fn get_events_by_timerange(
        &self,
        start: i64,
        stop: i64,
        filter: &TimerangeFilter,
    ) -> Result<Vec<EpgEvent>, StoreError>;

    fn get_event_by_id(&self, event_id: i64) -> Result<Option<EpgEvent>, StoreError>;

    /// Batch lookup. Result order is unspecified.
    fn get_events_by_ids(&self, event_ids: &[i64]) -> Result<Vec<EpgEvent>, StoreError>;

    /// All channels ordered by number (unnumbered last), then name.
    fn get_all_channels(&self) -> Result<Vec<CachedChannel>, StoreError>;

    /// Resolve a channel by display number or UUID.
    ///
    /// The identifier is treated as a number only when it is exactly the
    /// canonical rendering of an integer ("1", not "01" or "1.0").
    fn get_channel_by_uuid_or_number(
        &self,
        identifier: &str,
    ) -> Result<Option<CachedChannel>, StoreError>;

    /// Text projection of every event, used to rebuild the search index.
    fn get_all_events_for_indexing(&self) -> Result<Vec<IndexableEvent>, StoreError>;

    fn get_sync_meta(&self) -> Result<SyncMeta, StoreError>;

    /// Set the sync status. Entering `Refreshing` also records the start time.
    fn update_sync_status(&self, status: SyncStatus) -> Result<(), StoreError>;

    /// Mark a refresh complete: status idle, end time, duration and counts.
    fn update_sync_complete(&self, event_count: u64, channel_count: u64)
        -> Result<(), StoreError>;

    fn get_event_count(&self) -> Result<u64, StoreError>;

    fn get_channel_count(&self) -> Result<u64, StoreError>;
}
