//! Cache control handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use epg_cache_core::RefreshAccepted;
use tracing::info;

use super::error::{api_error, ApiError};
use crate::state::AppState;

/// POST /api/cache/refresh
///
/// Start a refresh in the background. 409 if one is already running.
pub async fn trigger_refresh(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<RefreshAccepted>), ApiError> {
    let accepted = state.query().trigger_refresh().map_err(api_error)?;
    info!("Manual refresh triggered");
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}
