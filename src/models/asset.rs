// Registry projection: assets, networks and their operator-configured limits

use serde::{Deserialize, Serialize};

/// Equipment type; serializes to lowercase JSON (e.g. "compressor").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Compressor,
    Sensor,
    Distributor,
}

/// Pressure bucket a reading falls into, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Low,
    Normal,
    Risk,
    Critical,
}

/// The four per-asset limits. Any of them may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityLimits {
    pub low: Option<f64>,
    pub normal: Option<f64>,
    pub risk: Option<f64>,
    pub critical: Option<f64>,
}

impl SeverityLimits {
    /// Configured limits with the tier each one opens, lowest tier first.
    pub fn configured(&self) -> impl Iterator<Item = (SeverityTier, f64)> + '_ {
        [
            (SeverityTier::Low, self.low),
            (SeverityTier::Normal, self.normal),
            (SeverityTier::Risk, self.risk),
            (SeverityTier::Critical, self.critical),
        ]
        .into_iter()
        .filter_map(|(tier, limit)| limit.map(|l| (tier, l)))
    }

    pub fn is_empty(&self) -> bool {
        self.configured().next().is_none()
    }

    /// True when every configured limit is strictly greater than the one before it.
    pub fn is_ascending(&self) -> bool {
        let limits: Vec<f64> = self.configured().map(|(_, l)| l).collect();
        limits.windows(2).all(|w| w[0] < w[1])
    }
}

/// Per-asset overrides of the deployment-wide polling defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOverrides {
    pub interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub escalation_threshold_ms: Option<u64>,
}

/// Configuration side of a monitored asset. The core never mutates these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub network_id: String,
    pub kind: AssetKind,
    pub telemetry_endpoint: Option<String>,
    pub max_pressure: Option<f64>,
    pub limits: SeverityLimits,
    /// Administrative maintenance flag at startup.
    #[serde(default)]
    pub maintenance: bool,
    #[serde(default)]
    pub overrides: PollOverrides,
}

/// A named group of assets for one client/site. Aggregation boundary only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    pub asset_ids: Vec<String>,
}
