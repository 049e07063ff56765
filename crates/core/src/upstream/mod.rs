//! Upstream program guide source.
//!
//! The refresh cycle pulls the complete event and channel listings through
//! the [`EpgSource`] trait. [`TvheadendClient`] is the production
//! implementation; tests use `testing::MockEpgSource`.

mod loader;
mod tvheadend;
mod types;

pub use loader::{fetch_all_channels, fetch_all_events, PAGE_SIZE};
pub use tvheadend::TvheadendClient;
pub use types::*;

use async_trait::async_trait;

/// A paginated source of program guide data.
#[async_trait]
pub trait EpgSource: Send + Sync {
    /// Fetch one page of events ordered by start time.
    async fn events_page(&self, offset: usize, limit: usize)
        -> Result<GridPage<EpgEvent>, UpstreamError>;

    /// Fetch one page of channels ordered by channel number.
    async fn channels_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<GridPage<Channel>, UpstreamError>;
}
