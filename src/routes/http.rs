// JSON handlers: version, summaries, asset state and poll control

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::models::{AssetState, NetworkSummary};
use crate::monitor::MonitorError;
use crate::version::{NAME, VERSION};

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = match &self {
            MonitorError::UnknownAsset(_) => StatusCode::NOT_FOUND,
            MonitorError::NoEndpoint(_) => StatusCode::CONFLICT,
            MonitorError::InvalidEndpoint { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct MaintenanceRequest {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct EndpointRequest {
    endpoint: String,
}

/// GET /version — service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/networks — every network's summary, in registry order.
pub(super) async fn networks_handler(State(state): State<AppState>) -> Json<Vec<NetworkSummary>> {
    Json(state.monitor.summaries())
}

pub(super) async fn network_summary_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NetworkSummary>, StatusCode> {
    state
        .monitor
        .summary(&id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub(super) async fn asset_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssetState>, MonitorError> {
    state
        .monitor
        .asset_state(&id)
        .map(Json)
        .ok_or(MonitorError::UnknownAsset(id))
}

/// PUT /api/assets/{id}/maintenance — the poll task applies the flag asynchronously.
pub(super) async fn maintenance_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MaintenanceRequest>,
) -> Result<StatusCode, MonitorError> {
    state.monitor.set_maintenance(&id, body.enabled).await?;
    Ok(StatusCode::ACCEPTED)
}

pub(super) async fn endpoint_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EndpointRequest>,
) -> Result<impl IntoResponse, MonitorError> {
    let generation = state.monitor.reconfigure(&id, &body.endpoint).await?;
    Ok(Json(serde_json::json!({ "generation": generation })))
}

pub(super) async fn start_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MonitorError> {
    let generation = state.monitor.start(&id).await?;
    Ok(Json(serde_json::json!({ "generation": generation })))
}

pub(super) async fn stop_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, MonitorError> {
    state.monitor.stop(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
