//! Request and response types for the query service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{StoreError, SyncStatus};
use crate::upstream::EpgEvent;

// ============================================================================
// Request parameters
// ============================================================================

/// Raw search parameters, as received on the query string.
///
/// Numeric fields stay strings until [`QueryService::search`](super::QueryService::search)
/// validates them, so malformed input becomes a readable error instead of
/// an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub channel: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub genre: Option<String>,
    pub limit: Option<String>,
}

/// Raw timerange parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimerangeParams {
    pub start: Option<String>,
    pub stop: Option<String>,
    pub channel: Option<String>,
    pub genre: Option<String>,
    pub limit: Option<String>,
}

/// Optional logo variant selector.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PiconParams {
    pub variant: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Stale,
    Error,
}

/// Full cache health, served by the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Seconds since the last completed refresh, -1 if none.
    pub cache_age: i64,
    pub last_refresh: Option<String>,
    pub refresh_status: SyncStatus,
    pub total_events: u64,
    pub total_channels: u64,
    pub last_refresh_duration: Option<i64>,
    pub next_refresh: Option<String>,
}

/// Freshness summary attached to every data response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheHealthMeta {
    pub cache_age: i64,
    pub last_refresh: Option<String>,
    pub refresh_status: SyncStatus,
    pub total_events: u64,
}

/// Data envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: CacheHealthMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub score: f64,
    pub event: EpgEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshAccepted {
    pub message: String,
}

/// Logo bytes ready to serve.
#[derive(Debug, Clone)]
pub struct PiconAsset {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(String),
}

impl QueryError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::Validation(_) => 400,
            QueryError::NotFound(_) => 404,
            QueryError::Conflict(_) => 409,
            QueryError::ServiceUnavailable(_) => 503,
            QueryError::Store(_) | QueryError::Io(_) => 500,
        }
    }
}
