//! Common test utilities for API testing with mocks.
//!
//! Builds an in-process router over an in-memory store seeded with a small
//! guide, a real search index and a mock refresh control.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use epg_cache_core::{
    testing::MockRefreshControl, EpgStore, PiconIndex, QueryService, RefreshControl, SearchIndex,
    SqliteEpgStore,
};
use epg_cache_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use epg_cache_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_channels() {
///     let fixture = TestFixture::new();
///     let response = fixture.get("/api/channels").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Store backing the router, for seeding sync state
    pub store: Arc<SqliteEpgStore>,
    /// Mock refresh control - toggle refreshing, count triggers
    pub refresh: Arc<MockRefreshControl>,
    /// Picon build-source directory, when picons are enabled
    pub picon_dir: Option<TempDir>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub bytes: Vec<u8>,
}

impl TestFixture {
    /// Seeded guide, picons not configured.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Seeded guide with a picon build-source tree.
    pub fn with_picons() -> Self {
        Self::build(true)
    }

    fn build(picons: bool) -> Self {
        let store = Arc::new(SqliteEpgStore::in_memory().expect("Failed to create store"));
        seed(&store);

        let search_index = Arc::new(SearchIndex::new());
        search_index
            .rebuild(store.as_ref())
            .expect("Failed to build search index");

        let refresh = Arc::new(MockRefreshControl::new());
        let mut query = QueryService::new(
            Arc::clone(&store) as Arc<dyn EpgStore>,
            search_index,
            Arc::clone(&refresh) as Arc<dyn RefreshControl>,
            3600,
        );

        let picon_dir = if picons {
            let dir = TempDir::new().expect("Failed to create temp dir");
            fixtures::write_picon_source(dir.path());
            let index = PiconIndex::open(dir.path()).expect("Failed to open picon index");
            query = query.with_picons(Arc::new(index));
            Some(dir)
        } else {
            None
        };

        let router = create_router(Arc::new(AppState::new(query)));

        Self {
            router,
            store,
            refresh,
            picon_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Three events on two channels:
/// 1 Tagesschau (ch-1, genre 16), 2 Tatort "Krimi aus Berlin" (ch-1, genre 32),
/// 3 Heute Journal (ch-2, genre 16).
fn seed(store: &SqliteEpgStore) {
    let mut tagesschau = fixtures::event(1, "ch-1", "Tagesschau", 1_700_000_000, 1_700_003_600);
    tagesschau.content_type = Some(16);
    tagesschau.channel_name = "Das Erste HD".into();

    let mut tatort = fixtures::event(2, "ch-1", "Tatort", 1_700_003_600, 1_700_009_000);
    tatort.subtitle = Some("Krimi aus Berlin".into());
    tatort.content_type = Some(32);
    tatort.channel_name = "Das Erste HD".into();

    let mut heute = fixtures::event(3, "ch-2", "Heute Journal", 1_700_000_000, 1_700_003_600);
    heute.content_type = Some(16);
    heute.channel_name = "ZDF HD".into();

    store
        .replace_all_events(&[tagesschau, tatort, heute])
        .expect("Failed to seed events");
    store
        .replace_all_channels(&[
            fixtures::channel("ch-1", "Das Erste HD", Some(1)),
            fixtures::channel("ch-2", "ZDF HD", Some(2)),
        ])
        .expect("Failed to seed channels");
}
