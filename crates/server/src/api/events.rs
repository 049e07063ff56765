//! Event API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use epg_cache_core::{ApiResponse, EpgEvent, SearchParams, SearchResult, TimerangeParams};

use super::error::{api_error, ApiError};
use crate::state::AppState;

/// GET /api/events/search
///
/// Fuzzy full-text search, optionally filtered by channel, time window and
/// genre.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<SearchResult>>>, ApiError> {
    state.query().search(&params).map(Json).map_err(api_error)
}

/// GET /api/events/timerange
///
/// Events overlapping `[start, stop)`.
pub async fn timerange(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimerangeParams>,
) -> Result<Json<ApiResponse<Vec<EpgEvent>>>, ApiError> {
    state.query().timerange(&params).map(Json).map_err(api_error)
}

/// GET /api/events/{event_id}
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<EpgEvent>>, ApiError> {
    state.query().event(&event_id).map(Json).map_err(api_error)
}
