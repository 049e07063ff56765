//! Mock refresh control for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::scheduler::RefreshControl;

/// Mock implementation of the RefreshControl trait.
///
/// Triggers are counted instead of running anything. A successful trigger
/// does not flip the refreshing flag; tests set it explicitly.
#[derive(Debug, Default)]
pub struct MockRefreshControl {
    refreshing: AtomicBool,
    next_refresh: Mutex<Option<DateTime<Utc>>>,
    triggers: AtomicUsize,
}

impl MockRefreshControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_refreshing(&self, refreshing: bool) {
        self.refreshing.store(refreshing, Ordering::SeqCst);
    }

    pub fn set_next_refresh_time(&self, time: Option<DateTime<Utc>>) {
        *self.next_refresh.lock().unwrap_or_else(|e| e.into_inner()) = time;
    }

    /// Number of accepted triggers.
    pub fn trigger_count(&self) -> usize {
        self.triggers.load(Ordering::SeqCst)
    }
}

impl RefreshControl for MockRefreshControl {
    fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    fn next_refresh_time(&self) -> Option<DateTime<Utc>> {
        *self.next_refresh.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn trigger_refresh(&self) -> bool {
        if self.is_refreshing() {
            return false;
        }
        self.triggers.fetch_add(1, Ordering::SeqCst);
        true
    }
}
