//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here; refresh, cache and search metrics come
//! from `epg_cache_core::metrics` and are registered into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

use epg_cache_core::{metrics as core_metrics, SyncStatus};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "epg_cache_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("epg_cache_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "epg_cache_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Refresh state (collected dynamically)
// =============================================================================

/// 1 while a refresh is running.
pub static REFRESH_IN_PROGRESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "epg_cache_refresh_in_progress",
        "Whether a refresh is currently running (1) or not (0)",
    )
    .unwrap()
});

/// Seconds since the last completed refresh, -1 if none.
pub static CACHE_AGE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "epg_cache_age_seconds",
        "Seconds since the last completed refresh",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(REFRESH_IN_PROGRESS.clone()))
        .unwrap();
    registry.register(Box::new(CACHE_AGE.clone())).unwrap();

    // Core metrics (refresh, cache contents, search)
    for metric in core_metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh gauges from the sync record before a scrape.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    match state.query().health() {
        Ok(report) => {
            REFRESH_IN_PROGRESS.set(i64::from(report.refresh_status == SyncStatus::Refreshing));
            CACHE_AGE.set(report.cache_age);
            core_metrics::CACHED_EVENTS.set(report.total_events as i64);
            core_metrics::CACHED_CHANNELS.set(report.total_channels as i64);
        }
        Err(e) => tracing::warn!("Failed to collect cache metrics: {}", e),
    }
}

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/-?\d+(/|$)").unwrap());
static PICON_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/api/picon/(channel|srp)/[^/]+$").unwrap());
static EVENT_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/api/events/([^/]+)$").unwrap());

/// Normalize a path for metric labels (replace ids and names with placeholders).
pub fn normalize_path(path: &str) -> String {
    // Malformed ids still get one label value.
    if let Some(caps) = EVENT_SEGMENT.captures(path) {
        if !matches!(&caps[1], "search" | "timerange") {
            return "/api/events/{id}".to_string();
        }
    }

    let result = PICON_SEGMENT.replace(path, "/api/picon/$1/{name}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/events/12345"), "/api/events/{id}");
    }

    #[test]
    fn test_normalize_path_non_numeric_event_id() {
        assert_eq!(normalize_path("/api/events/abc"), "/api/events/{id}");
        assert_eq!(normalize_path("/api/events/12x"), "/api/events/{id}");
        assert_eq!(
            normalize_path("/api/events/timerange"),
            "/api/events/timerange"
        );
    }

    #[test]
    fn test_normalize_path_picon() {
        assert_eq!(
            normalize_path("/api/picon/channel/Das%20Erste%20HD"),
            "/api/picon/channel/{name}"
        );
        assert_eq!(
            normalize_path("/api/picon/srp/1D5_B_1_130000"),
            "/api/picon/srp/{name}"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/health"), "/api/health");
        assert_eq!(
            normalize_path("/api/events/search"),
            "/api/events/search"
        );
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();
        core_metrics::SEARCH_QUERIES.inc();

        let output = encode_metrics();
        assert!(output.contains("epg_cache_http_requests_total"));
        assert!(output.contains("epg_cache_search_queries_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}
