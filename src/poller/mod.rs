// Per-asset polling: one tokio task per observed asset, at most one request in flight.

mod fetch;
mod task;

pub use fetch::{FetchError, TUNNEL_BYPASS_HEADER, TelemetryClient, check_endpoint};
pub(crate) use task::PollLoop;

use std::time::Duration;
use tokio::sync::oneshot;
use tracing::warn;

use crate::config::PollingConfig;
use crate::escalation::DEFAULT_ESCALATION_THRESHOLD;
use crate::models::PollOverrides;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Timing for one asset's poll task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
    pub escalation_threshold: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
        }
    }
}

impl PollSettings {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            timeout: Duration::from_millis(config.timeout_ms),
            escalation_threshold: Duration::from_millis(config.escalation_threshold_ms),
        }
    }

    /// Applies an asset's own overrides on top of these defaults.
    pub fn with_overrides(self, overrides: &PollOverrides) -> Self {
        Self {
            interval: overrides
                .interval_ms
                .map_or(self.interval, Duration::from_millis),
            timeout: overrides
                .timeout_ms
                .map_or(self.timeout, Duration::from_millis),
            escalation_threshold: overrides
                .escalation_threshold_ms
                .map_or(self.escalation_threshold, Duration::from_millis),
        }
    }
}

/// Handle to a running poll loop.
pub(crate) struct PollTask {
    pub(crate) endpoint: String,
    pub(crate) generation: u64,
    shutdown_tx: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl PollTask {
    pub(crate) fn spawn(poll_loop: PollLoop) -> Self {
        let endpoint = poll_loop.endpoint().to_string();
        let generation = poll_loop.generation();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(poll_loop.run(shutdown_rx));
        Self {
            endpoint,
            generation,
            shutdown_tx,
            handle,
        }
    }

    /// Signals the loop to stop and waits for it; the loop aborts its in-flight request.
    pub(crate) async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await
            && !e.is_cancelled()
        {
            warn!(error = %e, generation = self.generation, "poll task ended abnormally");
        }
    }

    pub(crate) fn abort(&self) {
        self.handle.abort();
    }
}
