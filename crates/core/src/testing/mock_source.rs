//! Mock upstream guide source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::upstream::{Channel, EpgEvent, EpgSource, GridPage, UpstreamError};

/// Mock implementation of the EpgSource trait.
///
/// Serves configured events and channels in pages and records the offsets
/// it was asked for.
///
/// # Example
///
/// ```rust,ignore
/// use epg_cache_core::testing::{MockEpgSource, fixtures};
///
/// let source = MockEpgSource::new();
/// source.set_events((0..1200).map(|i| fixtures::event(i, "ch-1", "Show", i, i + 1)).collect()).await;
///
/// let events = fetch_all_events(&source).await?;
/// assert_eq!(source.event_page_requests().await, vec![0, 500, 1000]);
/// ```
#[derive(Debug, Default)]
pub struct MockEpgSource {
    events: Arc<RwLock<Vec<EpgEvent>>>,
    channels: Arc<RwLock<Vec<Channel>>>,
    /// Offsets of event page requests, in call order.
    event_requests: Arc<RwLock<Vec<usize>>>,
    /// Offsets of channel page requests, in call order.
    channel_requests: Arc<RwLock<Vec<usize>>>,
    /// If set, the next page request fails with this error.
    next_error: Arc<RwLock<Option<UpstreamError>>>,
    /// Simulated latency per page request.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockEpgSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_events(&self, events: Vec<EpgEvent>) {
        *self.events.write().await = events;
    }

    pub async fn set_channels(&self, channels: Vec<Channel>) {
        *self.channels.write().await = channels;
    }

    /// Make the next page request (events or channels) fail.
    pub async fn set_next_error(&self, error: UpstreamError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn event_page_requests(&self) -> Vec<usize> {
        self.event_requests.read().await.clone()
    }

    pub async fn channel_page_requests(&self) -> Vec<usize> {
        self.channel_requests.read().await.clone()
    }

    async fn before_request(&self) -> Result<(), UpstreamError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

fn page<T: Clone>(items: &[T], offset: usize, limit: usize) -> GridPage<T> {
    GridPage {
        entries: items.iter().skip(offset).take(limit).cloned().collect(),
        total: items.len(),
    }
}

#[async_trait]
impl EpgSource for MockEpgSource {
    async fn events_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<GridPage<EpgEvent>, UpstreamError> {
        self.event_requests.write().await.push(offset);
        self.before_request().await?;
        Ok(page(&self.events.read().await, offset, limit))
    }

    async fn channels_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<GridPage<Channel>, UpstreamError> {
        self.channel_requests.write().await.push(offset);
        self.before_request().await?;
        Ok(page(&self.channels.read().await, offset, limit))
    }
}
