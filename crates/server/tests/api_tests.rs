//! HTTP API tests against an in-process router.

mod common;

use axum::http::StatusCode;
use epg_cache_core::{EpgStore, SyncStatus};

use common::TestFixture;

fn mark_refreshed(fixture: &TestFixture) {
    fixture
        .store
        .update_sync_status(SyncStatus::Refreshing)
        .unwrap();
    fixture.store.update_sync_complete(3, 2).unwrap();
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_before_first_refresh() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "error");
    assert_eq!(response.body["cacheAge"], -1);
    assert!(response.body["lastRefresh"].is_null());
    assert!(response.body["lastRefreshDuration"].is_null());
    assert!(response.body["nextRefresh"].is_null());
    assert_eq!(response.body["refreshStatus"], "idle");
}

#[tokio::test]
async fn test_health_after_refresh() {
    let fixture = TestFixture::new();
    mark_refreshed(&fixture);
    fixture
        .refresh
        .set_next_refresh_time(chrono::DateTime::from_timestamp(1_771_066_800, 0));

    let response = fixture.get("/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["totalEvents"], 3);
    assert_eq!(response.body["totalChannels"], 2);
    assert!(response.body["lastRefresh"].is_string());
    assert!(response.body["lastRefreshDuration"].is_number());
    assert_eq!(response.body["nextRefresh"], "2026-02-14T11:00:00.000Z");
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_requires_query() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/events/search").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Query parameter \"q\" is required");
}

#[tokio::test]
async fn test_search_by_title() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/events/search?q=tatort").await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.body["data"].as_array().unwrap();
    assert!(!data.is_empty());
    assert_eq!(data[0]["event"]["title"], "Tatort");
    assert!(data[0]["score"].as_f64().unwrap() > 0.0);
    assert!(response.body["meta"]["cacheAge"].is_number());
}

#[tokio::test]
async fn test_search_is_fuzzy() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/events/search?q=tagesschu").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"][0]["event"]["eventId"], 1);
}

#[tokio::test]
async fn test_search_by_subtitle() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/events/search?q=Berlin").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"][0]["event"]["eventId"], 2);
}

#[tokio::test]
async fn test_search_filters_by_channel_number() {
    let fixture = TestFixture::new();
    let response = fixture
        .get("/api/events/search?q=tagesschau%20heute&channel=2")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["event"]["channelUuid"], "ch-2");
}

#[tokio::test]
async fn test_search_filters_by_genre() {
    let fixture = TestFixture::new();
    let response = fixture
        .get("/api/events/search?q=tagesschau%20tatort&genre=32")
        .await;

    let data = response.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["event"]["eventId"], 2);
}

#[tokio::test]
async fn test_search_unknown_channel() {
    let fixture = TestFixture::new();
    let response = fixture
        .get("/api/events/search?q=tatort&channel=nonexistent")
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Channel \"nonexistent\" not found");
}

#[tokio::test]
async fn test_search_rejects_malformed_limit() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/events/search?q=tatort&limit=ten").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Timerange
// =============================================================================

#[tokio::test]
async fn test_timerange() {
    let fixture = TestFixture::new();
    let response = fixture
        .get("/api/events/timerange?start=1700000000&stop=1700003600")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let ids: Vec<i64> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["eventId"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_timerange_with_channel_and_limit() {
    let fixture = TestFixture::new();
    let response = fixture
        .get("/api/events/timerange?start=1700000000&stop=1700009000&channel=ch-1&limit=1")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["eventId"], 1);
}

#[tokio::test]
async fn test_timerange_channel_by_number() {
    let fixture = TestFixture::new();
    let response = fixture
        .get("/api/events/timerange?start=1700000000&stop=1700009000&channel=2")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["eventId"], 3);
    assert!(data.iter().all(|e| e["channelUuid"] == "ch-2"));
}

#[tokio::test]
async fn test_timerange_requires_start_and_stop() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/events/timerange?start=1700000000").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["error"],
        "Query parameters \"start\" and \"stop\" are required"
    );
}

#[tokio::test]
async fn test_timerange_unknown_channel() {
    let fixture = TestFixture::new();
    let response = fixture
        .get("/api/events/timerange?start=1700000000&stop=1700009000&channel=99")
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Single event
// =============================================================================

#[tokio::test]
async fn test_get_event() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/events/2").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["title"], "Tatort");
    assert_eq!(response.body["data"]["subtitle"], "Krimi aus Berlin");
    assert_eq!(response.body["meta"]["refreshStatus"], "idle");
}

#[tokio::test]
async fn test_get_event_invalid_id() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/events/abc").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid event ID");
}

#[tokio::test]
async fn test_get_event_not_found() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/events/99999").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Event not found");
}

// =============================================================================
// Channels
// =============================================================================

#[tokio::test]
async fn test_list_channels() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/channels").await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["name"], "Das Erste HD");
    assert_eq!(data[0]["enabled"], true);
    assert!(data[0]["icon"].is_null());
}

// =============================================================================
// Manual refresh
// =============================================================================

#[tokio::test]
async fn test_trigger_refresh() {
    let fixture = TestFixture::new();
    let response = fixture.post("/api/cache/refresh").await;

    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["message"], "Refresh started");
    assert_eq!(fixture.refresh.trigger_count(), 1);
}

#[tokio::test]
async fn test_trigger_refresh_conflict() {
    let fixture = TestFixture::new();
    fixture.refresh.set_refreshing(true);

    let response = fixture.post("/api/cache/refresh").await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "Refresh already in progress");
    assert_eq!(fixture.refresh.trigger_count(), 0);
}

// =============================================================================
// Picons
// =============================================================================

#[tokio::test]
async fn test_picon_not_configured() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/picon/channel/Das%20Erste%20HD").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("not configured"));

    let response = fixture.get("/api/picon/srp/1D5_B_1_130000").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_picon_svg_with_cache_headers() {
    let fixture = TestFixture::with_picons();
    let response = fixture.get("/api/picon/channel/Das%20Erste%20HD").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/svg+xml"));
    assert_eq!(
        response.header("cache-control"),
        Some("public, max-age=86400, stale-while-revalidate=604800")
    );
    assert_eq!(response.bytes, b"<svg>daserste</svg>");
}

#[tokio::test]
async fn test_picon_png() {
    let fixture = TestFixture::with_picons();
    let response = fixture.get("/api/picon/channel/PNG%20Only").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/png"));
}

#[tokio::test]
async fn test_picon_variant() {
    let fixture = TestFixture::with_picons();

    let response = fixture
        .get("/api/picon/channel/With%20Variants?variant=dark")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.bytes, b"<svg>dark</svg>");

    let response = fixture
        .get("/api/picon/channel/Das%20Erste%20HD?variant=black")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.bytes, b"<svg>daserste</svg>");
}

#[tokio::test]
async fn test_picon_invalid_variant() {
    let fixture = TestFixture::with_picons();

    let response = fixture
        .get("/api/picon/channel/Das%20Erste%20HD?variant=neon")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("Invalid variant"));

    let response = fixture
        .get("/api/picon/srp/1D5_B_1_130000?variant=rainbow")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_picon_not_found() {
    let fixture = TestFixture::with_picons();

    let response = fixture.get("/api/picon/channel/NonexistentChannel").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = fixture.get("/api/picon/srp/AAAA_B_1_130000").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_picon_by_service_ref() {
    let fixture = TestFixture::with_picons();
    let response = fixture.get("/api/picon/srp/1D5_B_1_130000").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/svg+xml"));
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/channels").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);

    let text = String::from_utf8(response.bytes).unwrap();
    assert!(text.contains("epg_cache_http_requests_total"));
    assert!(text.contains("epg_cache_events"));
}
