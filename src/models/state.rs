// Derived per-asset state, written only by the asset's poll loop

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TelemetrySample;

/// Reachability as shown on the dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Online,
    Offline,
    Maintenance,
}

/// Anomaly escalation state machine output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationState {
    #[default]
    Normal,
    Anomaly,
    Risk,
}

/// Result of the last poll that reached a verdict on reachability.
/// A malformed body is not an outcome: it neither proves nor disproves reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollOutcome {
    Success,
    Failure,
}

/// Committed state for one asset, as read by the aggregator and the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetState {
    pub asset_id: String,
    pub network_id: String,
    pub endpoint: Option<String>,
    /// Whether a poll task currently owns this asset.
    pub observed: bool,
    /// Bumped on every start/stop/reconfigure; commits from older generations are rejected.
    pub generation: u64,
    pub maintenance: bool,
    pub last_outcome: Option<PollOutcome>,
    pub health: HealthStatus,
    pub escalation: EscalationState,
    pub anomaly_since: Option<DateTime<Utc>>,
    pub last_sample: Option<TelemetrySample>,
}
