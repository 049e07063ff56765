//! Channel logo handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use epg_cache_core::{PiconAsset, PiconParams};

use super::error::{api_error, ApiError};
use crate::state::AppState;

/// Logos change rarely; let clients keep them for a day and serve stale
/// copies for a week while revalidating.
const PICON_CACHE_CONTROL: &str = "public, max-age=86400, stale-while-revalidate=604800";

/// GET /api/picon/channel/{channel_name}
pub async fn by_channel_name(
    State(state): State<Arc<AppState>>,
    Path(channel_name): Path<String>,
    Query(params): Query<PiconParams>,
) -> Result<Response, ApiError> {
    state
        .query()
        .picon_by_channel_name(&channel_name, params.variant.as_deref())
        .await
        .map(image_response)
        .map_err(api_error)
}

/// GET /api/picon/srp/{service_ref}
pub async fn by_service_ref(
    State(state): State<Arc<AppState>>,
    Path(service_ref): Path<String>,
    Query(params): Query<PiconParams>,
) -> Result<Response, ApiError> {
    state
        .query()
        .picon_by_service_ref(&service_ref, params.variant.as_deref())
        .await
        .map(image_response)
        .map_err(api_error)
}

fn image_response(asset: PiconAsset) -> Response {
    let mut response = (StatusCode::OK, Body::from(asset.bytes)).into_response();

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(asset.content_type),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(PICON_CACHE_CONTROL),
    );

    response
}
