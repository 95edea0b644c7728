// Integration tests: HTTP and WebSocket endpoints

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::{FakeEndpoint, Reply, pressure};
use fleetwatch::models::{AssetState, HealthStatus, NetworkSummary};
use fleetwatch::monitor::Monitor;
use fleetwatch::routes;
use serde_json::{Value, json};
use std::sync::Arc;

fn test_monitor(endpoint: Option<&str>) -> Arc<Monitor> {
    common::monitor(
        vec![
            common::asset("C-101", "plant-a", endpoint),
            common::asset("S-201", "plant-a", None),
            common::asset("D-301", "plant-b", None),
        ],
        common::fast_settings(),
    )
}

fn test_server(monitor: Arc<Monitor>) -> TestServer {
    TestServer::new(routes::app(monitor))
}

/// Build TestServer with http_transport (required for WebSocket tests).
fn test_server_with_http(monitor: Arc<Monitor>) -> TestServer {
    TestServer::builder()
        .http_transport()
        .build(routes::app(monitor))
}

#[tokio::test]
async fn test_version_endpoint() {
    let server = test_server(test_monitor(None));
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("fleetwatch")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_networks_endpoint_lists_summaries_in_order() {
    let server = test_server(test_monitor(None));
    let response = server.get("/api/networks").await;
    response.assert_status_ok();
    let summaries: Vec<NetworkSummary> = response.json();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].network_id, "plant-a");
    assert_eq!(summaries[0].total, 2);
    assert_eq!(summaries[0].offline, 2);
    assert_eq!(summaries[1].network_id, "plant-b");
    assert_eq!(summaries[1].total, 1);
}

#[tokio::test]
async fn test_network_summary_endpoint() {
    let server = test_server(test_monitor(None));
    let response = server.get("/api/networks/plant-b/summary").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["networkId"], "plant-b");
    assert_eq!(json["total"], 1);
    assert_eq!(json["observed"], 0);

    server
        .get("/api/networks/nowhere/summary")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_asset_endpoint() {
    let server = test_server(test_monitor(None));
    let response = server.get("/api/assets/S-201").await;
    response.assert_status_ok();
    let state: AssetState = response.json();
    assert_eq!(state.asset_id, "S-201");
    assert_eq!(state.network_id, "plant-a");
    assert_eq!(state.health, HealthStatus::Offline);
    assert!(!state.observed);

    let response = server.get("/api/assets/X-999").await;
    response.assert_status_not_found();
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("X-999"));
}

#[tokio::test]
async fn test_maintenance_endpoint() {
    let monitor = test_monitor(None);
    let server = test_server(monitor.clone());

    server
        .put("/api/assets/S-201/maintenance")
        .json(&json!({ "enabled": true }))
        .await
        .assert_status(StatusCode::ACCEPTED);
    let state = common::wait_for_state(&monitor, "S-201", |s| s.maintenance).await;
    assert_eq!(state.health, HealthStatus::Maintenance);

    server
        .put("/api/assets/X-999/maintenance")
        .json(&json!({ "enabled": true }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_start_and_stop_endpoints() {
    let endpoint = FakeEndpoint::spawn(Reply::Json(pressure(6.0, false))).await;
    let monitor = test_monitor(Some(&endpoint.url));
    let server = test_server(monitor.clone());

    let response = server.post("/api/assets/C-101/start").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert!(json["generation"].as_u64().unwrap() >= 1);
    common::wait_for_state(&monitor, "C-101", |s| s.health == HealthStatus::Online).await;

    server
        .post("/api/assets/C-101/stop")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(!monitor.is_polling("C-101").await);
    assert!(!monitor.asset_state("C-101").unwrap().observed);

    // No endpoint configured.
    server
        .post("/api/assets/S-201/start")
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_endpoint_reconfiguration() {
    let endpoint = FakeEndpoint::spawn(Reply::Json(pressure(6.0, false))).await;
    let monitor = test_monitor(None);
    let server = test_server(monitor.clone());

    let response = server
        .put("/api/assets/S-201/endpoint")
        .json(&json!({ "endpoint": endpoint.url }))
        .await;
    response.assert_status_ok();
    let state =
        common::wait_for_state(&monitor, "S-201", |s| s.health == HealthStatus::Online).await;
    assert_eq!(state.endpoint.as_deref(), Some(endpoint.url.as_str()));
    let json: Value = response.json();
    assert_eq!(json["generation"].as_u64(), Some(state.generation));

    server
        .put("/api/assets/S-201/endpoint")
        .json(&json!({ "endpoint": "ftp://example.test/data" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    // The running task is untouched by a rejected endpoint.
    assert!(monitor.is_polling("S-201").await);
}

// --- WebSocket message tests (require http_transport + ws feature) ---
// Receive until we get valid JSON (server may send Ping first).

async fn receive_first_json_text<T: serde::de::DeserializeOwned>(
    ws: &mut axum_test::TestWebSocket,
) -> T {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(3);
    loop {
        let text = ws.receive_text().await;
        if let Ok(v) = serde_json::from_str::<T>(&text) {
            return v;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for JSON"
        );
    }
}

#[tokio::test]
async fn test_ws_events_sends_welcome_with_summaries() {
    let server = test_server_with_http(test_monitor(None));
    let mut ws = server
        .get_websocket("/ws/events")
        .await
        .into_websocket()
        .await;
    let welcome: Value = receive_first_json_text(&mut ws).await;
    assert_eq!(welcome["type"], "info");
    let networks = welcome["networks"].as_array().unwrap();
    assert_eq!(networks.len(), 2);
    assert_eq!(networks[0]["networkId"], "plant-a");
}

#[tokio::test]
async fn test_ws_events_streams_health_changes() {
    let monitor = test_monitor(None);
    let server = test_server_with_http(monitor.clone());
    let mut ws = server
        .get_websocket("/ws/events")
        .await
        .into_websocket()
        .await;
    let _welcome: Value = receive_first_json_text(&mut ws).await;

    monitor.set_maintenance("D-301", true).await.unwrap();

    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(3);
    loop {
        let event: Value = receive_first_json_text(&mut ws).await;
        if event["type"] == "healthChange" {
            assert_eq!(event["assetId"], "D-301");
            assert_eq!(event["networkId"], "plant-b");
            assert_eq!(event["status"], "maintenance");
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for healthChange"
        );
    }
}
