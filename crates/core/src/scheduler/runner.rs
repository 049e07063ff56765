//! Refresh scheduler implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::search::SearchIndex;
use crate::store::{EpgStore, SyncStatus};
use crate::upstream::{fetch_all_channels, fetch_all_events, EpgSource};

use super::types::{RefreshError, RefreshOutcome};
use super::RefreshControl;

/// State shared between the scheduler handle and its spawned tasks.
struct Shared {
    source: Arc<dyn EpgSource>,
    store: Arc<dyn EpgStore>,
    search_index: Arc<SearchIndex>,
    interval: Duration,
    refreshing: AtomicBool,
    running: AtomicBool,
    next_refresh: Mutex<Option<DateTime<Utc>>>,
}

/// Drives periodic and on-demand refreshes of the cache.
pub struct RefreshScheduler {
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RefreshScheduler {
    pub fn new(
        source: Arc<dyn EpgSource>,
        store: Arc<dyn EpgStore>,
        search_index: Arc<SearchIndex>,
        interval: Duration,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            shared: Arc::new(Shared {
                source,
                store,
                search_index,
                interval,
                refreshing: AtomicBool::new(false),
                running: AtomicBool::new(false),
                next_refresh: Mutex::new(None),
            }),
            shutdown_tx,
        }
    }

    /// Start the schedule. The first refresh begins immediately.
    pub async fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            warn!("Refresh scheduler already running");
            return;
        }

        info!(
            interval_secs = self.shared.interval.as_secs(),
            "Starting refresh scheduler"
        );
        self.shared.schedule_next();
        self.spawn_refresh_loop();
    }

    /// Stop the schedule. A refresh already in flight runs to completion.
    pub async fn stop(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            warn!("Refresh scheduler not running");
            return;
        }

        let _ = self.shutdown_tx.send(());
        self.shared.set_next_refresh(None);
        info!("Refresh scheduler stopped");
    }

    /// Run one refresh cycle to completion.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.shared.refresh().await
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn spawn_refresh_loop(&self) {
        let shared = Arc::clone(&self.shared);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(shared.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Refresh loop received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !shared.running.load(Ordering::SeqCst) {
                            break;
                        }
                        // Run detached so a slow upstream never delays the next tick.
                        let shared = Arc::clone(&shared);
                        tokio::spawn(async move {
                            shared.refresh().await;
                        });
                    }
                }
            }
        });
    }
}

impl RefreshControl for RefreshScheduler {
    fn is_refreshing(&self) -> bool {
        self.shared.refreshing.load(Ordering::SeqCst)
    }

    fn next_refresh_time(&self) -> Option<DateTime<Utc>> {
        *self
            .shared
            .next_refresh
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn trigger_refresh(&self) -> bool {
        if !self.shared.try_begin() {
            return false;
        }

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            shared.run_claimed().await;
        });
        true
    }
}

impl Shared {
    /// Claim the single refresh slot.
    fn try_begin(&self) -> bool {
        self.refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    async fn refresh(&self) -> RefreshOutcome {
        if !self.try_begin() {
            debug!("Refresh already in progress, skipping");
            metrics::REFRESH_TOTAL.with_label_values(&["skipped"]).inc();
            return RefreshOutcome::Skipped;
        }
        self.run_claimed().await
    }

    /// Run a cycle while holding the refresh slot, then release it.
    async fn run_claimed(&self) -> RefreshOutcome {
        let started = Instant::now();

        let outcome = match self.run_cycle().await {
            Ok((events, channels)) => {
                let elapsed = started.elapsed();
                info!(
                    events,
                    channels,
                    duration_ms = elapsed.as_millis() as u64,
                    "Refresh completed"
                );
                metrics::REFRESH_TOTAL.with_label_values(&["success"]).inc();
                metrics::REFRESH_DURATION.observe(elapsed.as_secs_f64());
                metrics::CACHED_EVENTS.set(events as i64);
                metrics::CACHED_CHANNELS.set(channels as i64);
                RefreshOutcome::Completed { events, channels }
            }
            Err(e) => {
                error!("Refresh failed: {}", e);
                metrics::REFRESH_TOTAL.with_label_values(&["failed"]).inc();
                if let Err(e) = self.store.update_sync_status(SyncStatus::Idle) {
                    error!("Failed to reset sync status: {}", e);
                }
                RefreshOutcome::Failed(e)
            }
        };

        self.refreshing.store(false, Ordering::SeqCst);
        self.schedule_next();
        outcome
    }

    async fn run_cycle(&self) -> Result<(usize, usize), RefreshError> {
        self.store.update_sync_status(SyncStatus::Refreshing)?;

        let source = self.source.as_ref();
        let (events, channels) =
            futures::try_join!(fetch_all_events(source), fetch_all_channels(source))?;

        self.store.replace_all_events(&events)?;
        self.store.replace_all_channels(&channels)?;
        self.search_index.rebuild(self.store.as_ref())?;
        self.store
            .update_sync_complete(events.len() as u64, channels.len() as u64)?;

        Ok((events.len(), channels.len()))
    }

    /// Recompute the next due time, only while the schedule is running.
    fn schedule_next(&self) {
        if self.running.load(Ordering::SeqCst) {
            let next = chrono::Duration::from_std(self.interval)
                .ok()
                .and_then(|interval| Utc::now().checked_add_signed(interval));
            self.set_next_refresh(next);
        }
    }

    fn set_next_refresh(&self, value: Option<DateTime<Utc>>) {
        *self.next_refresh.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }
}
