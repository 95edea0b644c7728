// Fan-out of monitor events, plus "network changed" notices for the aggregator

use tokio::sync::{broadcast, mpsc};
use tracing::info;

use super::slot::Change;
use crate::models::{Asset, MonitorEvent, TelemetrySample};

#[derive(Debug, Clone)]
pub(crate) struct Publisher {
    events: broadcast::Sender<MonitorEvent>,
    changes: mpsc::UnboundedSender<String>,
}

impl Publisher {
    pub(crate) fn new(
        events: broadcast::Sender<MonitorEvent>,
        changes: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self { events, changes }
    }

    pub(crate) fn sample(&self, sample: TelemetrySample) {
        // No receivers is fine: nobody is watching the dashboards.
        let _ = self.events.send(MonitorEvent::Sample {
            asset_id: sample.asset_id.clone(),
            sample,
        });
    }

    /// Asks the aggregator to recompute `network_id` (e.g. an asset started or stopped).
    pub(crate) fn network_changed(&self, network_id: &str) {
        let _ = self.changes.send(network_id.to_string());
    }

    /// Publishes health/escalation changes and tells the aggregator the network moved.
    pub(crate) fn changed(&self, asset: &Asset, change: &Change) {
        if change.is_empty() {
            return;
        }
        if let Some(status) = change.health {
            info!(asset_id = %asset.id, network_id = %asset.network_id, ?status, "health changed");
            let _ = self.events.send(MonitorEvent::HealthChange {
                asset_id: asset.id.clone(),
                network_id: asset.network_id.clone(),
                status,
            });
        }
        if let Some(state) = change.escalation {
            info!(asset_id = %asset.id, network_id = %asset.network_id, ?state, "escalation changed");
            let _ = self.events.send(MonitorEvent::EscalationChange {
                asset_id: asset.id.clone(),
                network_id: asset.network_id.clone(),
                state,
            });
        }
        let _ = self.changes.send(asset.network_id.clone());
    }
}
