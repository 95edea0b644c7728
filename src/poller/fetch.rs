// Telemetry endpoint client (reqwest). One bounded GET per poll.

use bytes::Bytes;
use std::time::Duration;

/// Sent on every request so endpoints fronted by a development tunnel answer with the
/// device JSON instead of an HTML interstitial.
pub const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("reading body failed: {0}")]
    Body(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct TelemetryClient {
    http: reqwest::Client,
}

impl TelemetryClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// GETs `endpoint` and returns the body of a 2xx response. `timeout` bounds the whole
    /// exchange, body included. No auth header is sent.
    pub async fn fetch(&self, endpoint: &str, timeout: Duration) -> Result<Bytes, FetchError> {
        let request = self.http.get(endpoint).header(TUNNEL_BYPASS_HEADER, "true");
        let exchange = async {
            let response = request.send().await.map_err(FetchError::Transport)?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status));
            }
            response.bytes().await.map_err(FetchError::Body)
        };
        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout(timeout))?
    }
}

/// Checks that `endpoint` is an absolute http(s) URL.
pub fn check_endpoint(endpoint: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(endpoint).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme {other:?}")),
    }
}
