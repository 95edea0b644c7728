// Events published to collaborators (dashboards, alert dispatch)

use serde::{Deserialize, Serialize};

use super::{EscalationState, HealthStatus, NetworkSummary, TelemetrySample};

/// One message on the monitor's broadcast channel; serializes with a `type` tag
/// (e.g. `{"type":"healthChange","assetId":"C-101","status":"offline"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MonitorEvent {
    Sample {
        asset_id: String,
        sample: TelemetrySample,
    },
    HealthChange {
        asset_id: String,
        network_id: String,
        status: HealthStatus,
    },
    EscalationChange {
        asset_id: String,
        network_id: String,
        state: EscalationState,
    },
    NetworkSummary {
        summary: NetworkSummary,
    },
}

impl MonitorEvent {
    pub fn asset_id(&self) -> Option<&str> {
        match self {
            MonitorEvent::Sample { asset_id, .. }
            | MonitorEvent::HealthChange { asset_id, .. }
            | MonitorEvent::EscalationChange { asset_id, .. } => Some(asset_id),
            MonitorEvent::NetworkSummary { .. } => None,
        }
    }
}
