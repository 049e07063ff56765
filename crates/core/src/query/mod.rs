//! Read-side composition of the cache.
//!
//! [`QueryService`] validates caller parameters and answers them from the
//! store, the search index and the optional picon index. Every data response
//! carries a [`CacheHealthMeta`] so clients can judge freshness.

mod types;

pub use types::*;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::metrics;
use crate::picon::{PiconFile, PiconIndex, PiconVariant};
use crate::scheduler::RefreshControl;
use crate::search::{SearchIndex, DEFAULT_SEARCH_LIMIT};
use crate::store::{CachedChannel, EpgStore, TimerangeFilter};
use crate::upstream::EpgEvent;

/// Events returned by a timerange query without an explicit limit.
pub const DEFAULT_TIMERANGE_LIMIT: u32 = 100;

/// Search candidates fetched per requested result, to leave room for
/// post-filtering by channel, time and genre.
const SEARCH_OVERFETCH: usize = 5;

/// Answers all read requests and manual refresh triggers.
pub struct QueryService {
    store: Arc<dyn EpgStore>,
    search_index: Arc<SearchIndex>,
    refresh: Arc<dyn RefreshControl>,
    picons: Option<Arc<PiconIndex>>,
    refresh_interval_secs: u64,
}

impl QueryService {
    pub fn new(
        store: Arc<dyn EpgStore>,
        search_index: Arc<SearchIndex>,
        refresh: Arc<dyn RefreshControl>,
        refresh_interval_secs: u64,
    ) -> Self {
        Self {
            store,
            search_index,
            refresh,
            picons: None,
            refresh_interval_secs,
        }
    }

    /// Enable the picon endpoints.
    pub fn with_picons(mut self, picons: Arc<PiconIndex>) -> Self {
        self.picons = Some(picons);
        self
    }

    /// Cache health.
    ///
    /// `error` before any data has ever been loaded, `stale` once the last
    /// completed refresh is older than two intervals, `healthy` otherwise.
    pub fn health(&self) -> Result<HealthReport, QueryError> {
        let meta = self.store.get_sync_meta()?;
        let cache_age = cache_age(meta.last_refresh_end);

        let status = if meta.event_count == 0 && meta.last_refresh_end == 0 {
            HealthStatus::Error
        } else if cache_age > self.refresh_interval_secs.saturating_mul(2) as i64 {
            HealthStatus::Stale
        } else {
            HealthStatus::Healthy
        };

        Ok(HealthReport {
            status,
            cache_age,
            last_refresh: iso_from_unix(meta.last_refresh_end),
            refresh_status: meta.status,
            total_events: meta.event_count,
            total_channels: meta.channel_count,
            last_refresh_duration: (meta.last_refresh_end > 0).then_some(meta.last_refresh_duration),
            next_refresh: self.refresh.next_refresh_time().map(iso),
        })
    }

    pub fn cache_meta(&self) -> Result<CacheHealthMeta, QueryError> {
        let meta = self.store.get_sync_meta()?;
        Ok(CacheHealthMeta {
            cache_age: cache_age(meta.last_refresh_end),
            last_refresh: iso_from_unix(meta.last_refresh_end),
            refresh_status: meta.status,
            total_events: meta.event_count,
        })
    }

    /// Full-text search with optional post-filters.
    pub fn search(
        &self,
        params: &SearchParams,
    ) -> Result<ApiResponse<Vec<SearchResult>>, QueryError> {
        let query = present(&params.q)
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| QueryError::Validation("Query parameter \"q\" is required".into()))?;

        let limit = parse_limit(&params.limit)?.unwrap_or(DEFAULT_SEARCH_LIMIT as u32) as usize;
        let start = parse_integer("start", &params.start)?;
        let stop = parse_integer("stop", &params.stop)?;
        let genre = parse_integer("genre", &params.genre)?;
        let channel_uuid = self.resolve_channel(&params.channel)?;

        metrics::SEARCH_QUERIES.inc();

        let scored = self
            .search_index
            .search(query, limit.saturating_mul(SEARCH_OVERFETCH));
        debug!(query, candidates = scored.len(), "Search executed");

        let mut results = Vec::new();
        if !scored.is_empty() {
            let ids: Vec<i64> = scored.iter().map(|s| s.event_id).collect();
            let mut events: HashMap<i64, EpgEvent> = self
                .store
                .get_events_by_ids(&ids)?
                .into_iter()
                .map(|e| (e.event_id, e))
                .collect();

            for hit in &scored {
                // Ids can vanish if a refresh lands between search and lookup.
                let Some(event) = events.remove(&hit.event_id) else {
                    continue;
                };
                if channel_uuid.as_ref().is_some_and(|uuid| &event.channel_uuid != uuid) {
                    continue;
                }
                if let (Some(start), Some(stop)) = (start, stop) {
                    if event.start >= stop || event.stop <= start {
                        continue;
                    }
                }
                if genre.is_some() && event.content_type != genre {
                    continue;
                }

                results.push(SearchResult {
                    score: hit.score,
                    event,
                });
                if results.len() >= limit {
                    break;
                }
            }
        }

        Ok(ApiResponse {
            data: results,
            meta: self.cache_meta()?,
        })
    }

    /// Events overlapping `[start, stop)`.
    pub fn timerange(
        &self,
        params: &TimerangeParams,
    ) -> Result<ApiResponse<Vec<EpgEvent>>, QueryError> {
        let (Some(start), Some(stop)) = (
            parse_integer("start", &params.start)?,
            parse_integer("stop", &params.stop)?,
        ) else {
            return Err(QueryError::Validation(
                "Query parameters \"start\" and \"stop\" are required".into(),
            ));
        };

        let genre = parse_integer("genre", &params.genre)?;
        let limit = parse_limit(&params.limit)?.unwrap_or(DEFAULT_TIMERANGE_LIMIT);
        let channel_uuid = self.resolve_channel(&params.channel)?;

        let filter = TimerangeFilter {
            channel_uuid,
            content_type: genre,
            limit: Some(limit),
        };
        let events = self.store.get_events_by_timerange(start, stop, &filter)?;

        Ok(ApiResponse {
            data: events,
            meta: self.cache_meta()?,
        })
    }

    /// A single event by its id, given as the raw path segment.
    pub fn event(&self, raw_id: &str) -> Result<ApiResponse<EpgEvent>, QueryError> {
        let event_id: i64 = raw_id
            .parse()
            .map_err(|_| QueryError::Validation("Invalid event ID".into()))?;

        let event = self
            .store
            .get_event_by_id(event_id)?
            .ok_or_else(|| QueryError::NotFound("Event not found".into()))?;

        Ok(ApiResponse {
            data: event,
            meta: self.cache_meta()?,
        })
    }

    pub fn channels(&self) -> Result<ApiResponse<Vec<CachedChannel>>, QueryError> {
        Ok(ApiResponse {
            data: self.store.get_all_channels()?,
            meta: self.cache_meta()?,
        })
    }

    /// Start a background refresh unless one is already running.
    pub fn trigger_refresh(&self) -> Result<RefreshAccepted, QueryError> {
        if self.refresh.is_refreshing() || !self.refresh.trigger_refresh() {
            return Err(QueryError::Conflict("Refresh already in progress".into()));
        }

        Ok(RefreshAccepted {
            message: "Refresh started".into(),
        })
    }

    pub async fn picon_by_channel_name(
        &self,
        name: &str,
        variant: Option<&str>,
    ) -> Result<PiconAsset, QueryError> {
        let picons = self.picons()?;
        let variant = parse_variant(variant)?;

        let file = picons
            .resolve_by_channel_name(name, variant)
            .ok_or_else(|| QueryError::NotFound(format!("Picon not found for channel \"{}\"", name)))?;
        read_picon(file).await
    }

    pub async fn picon_by_service_ref(
        &self,
        service_ref: &str,
        variant: Option<&str>,
    ) -> Result<PiconAsset, QueryError> {
        let picons = self.picons()?;
        let variant = parse_variant(variant)?;

        let file = picons
            .resolve_by_service_ref(service_ref, variant)
            .ok_or_else(|| {
                QueryError::NotFound(format!(
                    "Picon not found for service reference \"{}\"",
                    service_ref
                ))
            })?;
        read_picon(file).await
    }

    fn picons(&self) -> Result<&PiconIndex, QueryError> {
        self.picons
            .as_deref()
            .ok_or_else(|| QueryError::ServiceUnavailable("Picon index not configured".into()))
    }

    /// Map a channel number or UUID to a UUID. Absent means no filter.
    fn resolve_channel(&self, channel: &Option<String>) -> Result<Option<String>, QueryError> {
        let Some(identifier) = present(channel) else {
            return Ok(None);
        };

        match self.store.get_channel_by_uuid_or_number(identifier)? {
            Some(channel) => Ok(Some(channel.uuid)),
            None => Err(QueryError::NotFound(format!(
                "Channel \"{}\" not found",
                identifier
            ))),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Treat empty query-string values as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_integer(name: &str, value: &Option<String>) -> Result<Option<i64>, QueryError> {
    present(value)
        .map(|raw| {
            raw.parse::<i64>().map_err(|_| {
                QueryError::Validation(format!("Query parameter \"{}\" must be an integer", name))
            })
        })
        .transpose()
}

fn parse_limit(value: &Option<String>) -> Result<Option<u32>, QueryError> {
    present(value)
        .map(|raw| match raw.parse::<u32>() {
            Ok(limit) if limit >= 1 => Ok(limit),
            _ => Err(QueryError::Validation(
                "Query parameter \"limit\" must be a positive integer".into(),
            )),
        })
        .transpose()
}

fn parse_variant(variant: Option<&str>) -> Result<PiconVariant, QueryError> {
    match variant {
        None | Some("") => Ok(PiconVariant::Default),
        Some(raw) => raw
            .parse()
            .map_err(|e: crate::picon::InvalidVariant| QueryError::Validation(e.to_string())),
    }
}

async fn read_picon(file: PiconFile) -> Result<PiconAsset, QueryError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| QueryError::Io(format!("{}: {}", file.path.display(), e)))?;

    Ok(PiconAsset {
        bytes,
        content_type: file.content_type,
    })
}

fn cache_age(last_refresh_end: i64) -> i64 {
    if last_refresh_end > 0 {
        Utc::now().timestamp() - last_refresh_end
    } else {
        -1
    }
}

fn iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn iso_from_unix(secs: i64) -> Option<String> {
    if secs > 0 {
        DateTime::from_timestamp(secs, 0).map(iso)
    } else {
        None
    }
}
