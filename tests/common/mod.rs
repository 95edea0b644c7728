// Shared test helpers: a scriptable fake telemetry endpoint and monitor builders
#![allow(dead_code)]

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use fleetwatch::models::*;
use fleetwatch::monitor::{Monitor, MonitorConfig};
use fleetwatch::poller::{PollSettings, TUNNEL_BYPASS_HEADER, TelemetryClient};
use fleetwatch::registry::Registry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

const WAIT: Duration = Duration::from_secs(5);

/// What the fake endpoint answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(serde_json::Value),
    Status(u16),
    Text(&'static str),
    Delayed(Duration, serde_json::Value),
}

#[derive(Clone)]
pub struct FakeEndpoint {
    pub url: String,
    reply: Arc<Mutex<Reply>>,
    hits: Arc<AtomicUsize>,
    hit_times: Arc<Mutex<Vec<tokio::time::Instant>>>,
    bypass_headers: Arc<AtomicUsize>,
}

impl FakeEndpoint {
    pub async fn spawn(reply: Reply) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint = FakeEndpoint {
            url: format!("http://{addr}/telemetry"),
            reply: Arc::new(Mutex::new(reply)),
            hits: Arc::new(AtomicUsize::new(0)),
            hit_times: Arc::new(Mutex::new(Vec::new())),
            bypass_headers: Arc::new(AtomicUsize::new(0)),
        };
        let app = Router::new()
            .route("/telemetry", get(telemetry))
            .with_state(endpoint.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        endpoint
    }

    pub fn set(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// When each request arrived, in order.
    pub fn hit_times(&self) -> Vec<tokio::time::Instant> {
        self.hit_times.lock().unwrap().clone()
    }

    /// Requests that carried `ngrok-skip-browser-warning: true`.
    pub fn bypass_headers(&self) -> usize {
        self.bypass_headers.load(Ordering::SeqCst)
    }

    /// Waits until the endpoint has been hit at least `n` times.
    pub async fn wait_hits(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while self.hits() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {n} hits (got {})",
                self.hits()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

async fn telemetry(State(endpoint): State<FakeEndpoint>, headers: HeaderMap) -> Response {
    endpoint
        .hit_times
        .lock()
        .unwrap()
        .push(tokio::time::Instant::now());
    endpoint.hits.fetch_add(1, Ordering::SeqCst);
    if headers
        .get(TUNNEL_BYPASS_HEADER)
        .and_then(|v| v.to_str().ok())
        == Some("true")
    {
        endpoint.bypass_headers.fetch_add(1, Ordering::SeqCst);
    }
    let reply = endpoint.reply.lock().unwrap().clone();
    match reply {
        Reply::Json(v) => axum::Json(v).into_response(),
        Reply::Status(code) => StatusCode::from_u16(code).unwrap().into_response(),
        Reply::Text(body) => body.into_response(),
        Reply::Delayed(delay, v) => {
            tokio::time::sleep(delay).await;
            axum::Json(v).into_response()
        }
    }
}

/// URL on a port nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/telemetry")
}

pub fn asset(id: &str, network_id: &str, endpoint: Option<&str>) -> Asset {
    Asset {
        id: id.into(),
        network_id: network_id.into(),
        kind: AssetKind::Compressor,
        telemetry_endpoint: endpoint.map(String::from),
        max_pressure: Some(10.0),
        limits: SeverityLimits {
            low: Some(2.0),
            normal: Some(5.0),
            risk: Some(8.0),
            critical: Some(9.5),
        },
        maintenance: false,
        overrides: PollOverrides::default(),
    }
}

/// Short cadence so tests run in well under a second per transition.
pub fn fast_settings() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(50),
        timeout: Duration::from_millis(500),
        escalation_threshold: Duration::from_millis(120_000),
    }
}

/// Registry with one network per distinct `network_id`, in first-seen order.
pub fn registry(assets: Vec<Asset>) -> Registry {
    let mut networks: Vec<(String, String)> = Vec::new();
    for a in &assets {
        if !networks.iter().any(|(id, _)| *id == a.network_id) {
            networks.push((a.network_id.clone(), format!("Site {}", a.network_id)));
        }
    }
    Registry::new(networks, assets)
}

pub fn monitor(assets: Vec<Asset>, poll: PollSettings) -> Arc<Monitor> {
    Arc::new(Monitor::new(
        Arc::new(registry(assets)),
        TelemetryClient::new().unwrap(),
        MonitorConfig {
            poll,
            event_capacity: 1024,
            summary_log_interval: Duration::from_secs(3600),
        },
    ))
}

pub fn pressure(value: f64, is_anomaly: bool) -> serde_json::Value {
    serde_json::json!({ "pressure": value, "is_anomaly": is_anomaly, "mse": 0.02, "threshold": 0.05 })
}

/// Polls the committed state until `pred` holds.
pub async fn wait_for_state<F>(monitor: &Monitor, asset_id: &str, pred: F) -> AssetState
where
    F: Fn(&AssetState) -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let state = monitor.asset_state(asset_id).expect("asset is registered");
        if pred(&state) {
            return state;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for state of {asset_id}; last: {state:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Receives events until one matches `pred`.
pub async fn next_event<F>(rx: &mut broadcast::Receiver<MonitorEvent>, pred: F) -> MonitorEvent
where
    F: Fn(&MonitorEvent) -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Ok(event)) if pred(&event) => return event,
            Ok(Ok(_)) | Ok(Err(broadcast::error::RecvError::Lagged(_))) => {}
            Ok(Err(broadcast::error::RecvError::Closed)) => panic!("event channel closed"),
            Err(_) => panic!("timed out waiting for event"),
        }
    }
}
