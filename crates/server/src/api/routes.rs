use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{cache, channels, events, handlers, middleware::metrics_middleware, picon};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Events
        .route("/events/search", get(events::search))
        .route("/events/timerange", get(events::timerange))
        .route("/events/{event_id}", get(events::get_event))
        // Channels
        .route("/channels", get(channels::list_channels))
        // Cache control
        .route("/cache/refresh", post(cache::trigger_refresh))
        // Logos
        .route("/picon/channel/{channel_name}", get(picon::by_channel_name))
        .route("/picon/srp/{service_ref}", get(picon::by_service_ref));

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
