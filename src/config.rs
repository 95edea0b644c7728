use serde::Deserialize;
use std::collections::HashSet;

use crate::models::{AssetKind, PollOverrides, SeverityLimits};
use crate::poller::check_endpoint;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// How long an anomaly must persist before it escalates to risk.
    #[serde(default = "default_escalation_threshold_ms")]
    pub escalation_threshold_ms: u64,
    /// Max number of events kept in the broadcast channel (slow subscribers may lag).
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// How often to log the fleet summary at INFO level.
    #[serde(default = "default_summary_log_interval_secs")]
    pub summary_log_interval_secs: u64,
}

fn default_interval_ms() -> u64 {
    5_000
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_escalation_threshold_ms() -> u64 {
    120_000
}

fn default_event_capacity() -> usize {
    256
}

fn default_summary_log_interval_secs() -> u64 {
    60
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
            escalation_threshold_ms: default_escalation_threshold_ms(),
            event_capacity: default_event_capacity(),
            summary_log_interval_secs: default_summary_log_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    pub id: String,
    pub kind: AssetKind,
    pub endpoint: Option<String>,
    pub max_pressure: Option<f64>,
    #[serde(default)]
    pub limits: SeverityLimits,
    #[serde(default)]
    pub maintenance: bool,
    pub interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub escalation_threshold_ms: Option<u64>,
}

impl AssetConfig {
    pub fn overrides(&self) -> PollOverrides {
        PollOverrides {
            interval_ms: self.interval_ms,
            timeout_ms: self.timeout_ms,
            escalation_threshold_ms: self.escalation_threshold_ms,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.polling.interval_ms > 0,
            "polling.interval_ms must be > 0, got {}",
            self.polling.interval_ms
        );
        anyhow::ensure!(
            self.polling.timeout_ms > 0,
            "polling.timeout_ms must be > 0, got {}",
            self.polling.timeout_ms
        );
        anyhow::ensure!(
            self.polling.escalation_threshold_ms > 0,
            "polling.escalation_threshold_ms must be > 0, got {}",
            self.polling.escalation_threshold_ms
        );
        anyhow::ensure!(
            self.polling.event_capacity > 0,
            "polling.event_capacity must be > 0, got {}",
            self.polling.event_capacity
        );
        anyhow::ensure!(
            self.polling.summary_log_interval_secs > 0,
            "polling.summary_log_interval_secs must be > 0, got {}",
            self.polling.summary_log_interval_secs
        );

        let mut network_ids = HashSet::new();
        let mut asset_ids = HashSet::new();
        for network in &self.networks {
            anyhow::ensure!(!network.id.is_empty(), "networks.id must be non-empty");
            anyhow::ensure!(
                network_ids.insert(network.id.as_str()),
                "networks.id must be unique, got duplicate {}",
                network.id
            );
            for asset in &network.assets {
                anyhow::ensure!(
                    !asset.id.is_empty(),
                    "networks.assets.id must be non-empty (network {})",
                    network.id
                );
                anyhow::ensure!(
                    asset_ids.insert(asset.id.as_str()),
                    "networks.assets.id must be unique, got duplicate {}",
                    asset.id
                );
                anyhow::ensure!(
                    asset.limits.is_ascending(),
                    "networks.assets.limits must be ascending (low < normal < risk < critical) for asset {}",
                    asset.id
                );
                for (key, value) in [
                    ("interval_ms", asset.interval_ms),
                    ("timeout_ms", asset.timeout_ms),
                    ("escalation_threshold_ms", asset.escalation_threshold_ms),
                ] {
                    anyhow::ensure!(
                        value != Some(0),
                        "networks.assets.{} must be > 0 for asset {}",
                        key,
                        asset.id
                    );
                }
                if let Some(endpoint) = &asset.endpoint
                    && let Err(reason) = check_endpoint(endpoint)
                {
                    anyhow::bail!(
                        "networks.assets.endpoint is invalid for asset {}: {}",
                        asset.id,
                        reason
                    );
                }
            }
        }
        Ok(())
    }
}
