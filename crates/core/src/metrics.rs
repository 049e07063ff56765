//! Prometheus metrics for core components.
//!
//! Covers the refresh cycle, cache sizes and search traffic. The server
//! registers these alongside its HTTP metrics.

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Refresh
// =============================================================================

/// Refresh cycles by result.
pub static REFRESH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("epg_cache_refresh_total", "Total refresh cycles"),
        &["result"], // "success", "failed", "skipped"
    )
    .unwrap()
});

/// Wall-clock duration of successful refresh cycles.
pub static REFRESH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "epg_cache_refresh_duration_seconds",
            "Duration of a full upstream refresh",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
    )
    .unwrap()
});

// =============================================================================
// Cache contents
// =============================================================================

pub static CACHED_EVENTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("epg_cache_events", "Number of cached EPG events").unwrap()
});

pub static CACHED_CHANNELS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("epg_cache_channels", "Number of cached channels").unwrap()
});

// =============================================================================
// Search
// =============================================================================

pub static SEARCH_QUERIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "epg_cache_search_queries_total",
        "Total full-text search queries",
    )
    .unwrap()
});

/// All core metrics, for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(REFRESH_TOTAL.clone()),
        Box::new(REFRESH_DURATION.clone()),
        Box::new(CACHED_EVENTS.clone()),
        Box::new(CACHED_CHANNELS.clone()),
        Box::new(SEARCH_QUERIES.clone()),
    ]
}
