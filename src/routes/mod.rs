// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::monitor::Monitor;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) monitor: Arc<Monitor>,
}

pub fn app(monitor: Arc<Monitor>) -> Router {
    let state = AppState { monitor };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/networks", get(http::networks_handler)) // GET /api/networks
        .route(
            "/api/networks/{id}/summary",
            get(http::network_summary_handler),
        ) // GET /api/networks/{id}/summary
        .route("/api/assets/{id}", get(http::asset_handler)) // GET /api/assets/{id}
        .route(
            "/api/assets/{id}/maintenance",
            put(http::maintenance_handler),
        ) // PUT /api/assets/{id}/maintenance
        .route("/api/assets/{id}/endpoint", put(http::endpoint_handler)) // PUT /api/assets/{id}/endpoint
        .route("/api/assets/{id}/start", post(http::start_handler)) // POST /api/assets/{id}/start
        .route("/api/assets/{id}/stop", post(http::stop_handler)) // POST /api/assets/{id}/stop
        .route("/ws/events", get(ws::ws_events)) // WS /ws/events
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
