//! Channel API handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use epg_cache_core::{ApiResponse, CachedChannel};

use super::error::{api_error, ApiError};
use crate::state::AppState;

/// GET /api/channels
///
/// All cached channels ordered by number, unnumbered channels last.
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CachedChannel>>>, ApiError> {
    state.query().channels().map(Json).map_err(api_error)
}
