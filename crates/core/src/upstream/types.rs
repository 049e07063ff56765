//! Wire types for the TVHeadend grid API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One broadcast program instance.
///
/// This is both the upstream wire shape and the shape served to clients.
/// Optional fields are omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpgEvent {
    pub event_id: i64,
    pub channel_uuid: String,
    pub channel_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_icon: Option<String>,
    /// Unix seconds.
    pub start: i64,
    /// Unix seconds.
    pub stop: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_event_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star_rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widescreen: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_desc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitled: Option<bool>,
}

/// A tunable channel as reported by the upstream channel grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub uuid: String,
    /// Absent means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(
        default,
        alias = "icon_public_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon_public_url: Option<String>,
}

/// One page of a paginated grid response.
#[derive(Debug, Clone, Deserialize)]
pub struct GridPage<T> {
    pub entries: Vec<T>,
    pub total: usize,
}

/// Errors from the upstream source.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("Upstream connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream rejected request: {0}")]
    BadRequest(String),

    #[error("Upstream authentication failed: {0}")]
    Authentication(String),

    #[error("Upstream permission denied: {0}")]
    Authorization(String),

    #[error("Upstream resource not found: {0}")]
    NotFound(String),

    #[error("Upstream HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to parse upstream response: {0}")]
    Parse(String),
}
