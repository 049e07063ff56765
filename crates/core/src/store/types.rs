//! Types for the program guide store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A channel as cached locally.
///
/// Unlike events, absent optional fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedChannel {
    pub uuid: String,
    pub enabled: bool,
    pub name: String,
    pub number: Option<i64>,
    pub icon: Option<String>,
    pub icon_public_url: Option<String>,
}

/// Text fields of an event, as fed to the search index.
///
/// Missing text fields are empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexableEvent {
    pub event_id: i64,
    pub title: String,
    pub subtitle: String,
    pub summary: String,
    pub description: String,
}

/// Refresh status recorded in the sync record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Refreshing,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Refreshing => "refreshing",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(SyncStatus::Idle),
            "refreshing" => Ok(SyncStatus::Refreshing),
            "error" => Ok(SyncStatus::Error),
            other => Err(StoreError::Database(format!(
                "unknown sync status: {}",
                other
            ))),
        }
    }
}

/// Cache freshness record. Exactly one exists per store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMeta {
    /// Unix seconds, 0 if never started.
    pub last_refresh_start: i64,
    /// Unix seconds, 0 if never completed.
    pub last_refresh_end: i64,
    /// Seconds.
    pub last_refresh_duration: i64,
    pub event_count: u64,
    pub channel_count: u64,
    pub status: SyncStatus,
}

/// Optional conjunctive filters for timerange queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerangeFilter {
    pub channel_uuid: Option<String>,
    pub content_type: Option<i64>,
    /// Applied after ordering.
    pub limit: Option<u32>,
}

impl TimerangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel_uuid: impl Into<String>) -> Self {
        self.channel_uuid = Some(channel_uuid.into());
        self
    }

    pub fn with_content_type(mut self, content_type: i64) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Errors from store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_status_round_trips_through_str() {
        for status in [SyncStatus::Idle, SyncStatus::Refreshing, SyncStatus::Error] {
            assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
        }
        assert!("stuck".parse::<SyncStatus>().is_err());
    }

    #[test]
    fn test_cached_channel_serializes_nulls() {
        let channel = CachedChannel {
            uuid: "abc".to_string(),
            enabled: true,
            name: "ZDF".to_string(),
            number: None,
            icon: None,
            icon_public_url: None,
        };
        let value = serde_json::to_value(&channel).unwrap();
        assert!(value["number"].is_null());
        assert!(value["iconPublicUrl"].is_null());
    }
}
