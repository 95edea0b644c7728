// Status aggregation: network-level counts from committed per-asset state.
// A background worker recomputes a network's summary whenever a poll task reports a change
// there, and publishes it only when it differs from the last published one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument};

use crate::models::{AssetState, EscalationState, HealthStatus, MonitorEvent, NetworkSummary};
use crate::monitor::SlotTable;
use crate::registry::Registry;

/// Counts one network's assets. Pure: calling it twice on the same states gives the same result.
pub fn summarize<'a, I>(network_id: &str, states: I) -> NetworkSummary
where
    I: IntoIterator<Item = &'a AssetState>,
{
    let mut summary = NetworkSummary {
        network_id: network_id.to_string(),
        ..Default::default()
    };
    for state in states {
        summary.total += 1;
        if state.observed {
            summary.observed += 1;
        }
        match state.health {
            HealthStatus::Online => summary.online += 1,
            HealthStatus::Offline => summary.offline += 1,
            HealthStatus::Maintenance => summary.maintenance += 1,
        }
        match state.escalation {
            EscalationState::Normal => {}
            EscalationState::Anomaly => summary.anomaly += 1,
            EscalationState::Risk => summary.risk += 1,
        }
    }
    summary
}

/// Summary of `network_id` from a snapshot of each of its assets' committed state.
pub(crate) fn network_summary(
    registry: &Registry,
    slots: &SlotTable,
    network_id: &str,
) -> Option<NetworkSummary> {
    let network = registry.network(network_id)?;
    let states: Vec<AssetState> = network
        .asset_ids
        .iter()
        .filter_map(|id| slots.get(id))
        .map(|slot| slot.snapshot())
        .collect();
    Some(summarize(network_id, &states))
}

/// Shared state and channels for the aggregation worker.
pub(crate) struct AggregatorDeps {
    pub(crate) registry: Arc<Registry>,
    pub(crate) slots: Arc<SlotTable>,
    pub(crate) events: broadcast::Sender<MonitorEvent>,
    pub(crate) changes_rx: mpsc::UnboundedReceiver<String>,
}

/// Spawns the aggregation worker. It exits when every change sender is dropped.
pub(crate) fn spawn(
    deps: AggregatorDeps,
    summary_log_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(deps, summary_log_interval))
}

#[instrument(name = "aggregator", skip(deps), fields(log_interval_secs = summary_log_interval.as_secs()))]
async fn run(deps: AggregatorDeps, summary_log_interval: Duration) {
    let AggregatorDeps {
        registry,
        slots,
        events,
        mut changes_rx,
    } = deps;
    let mut published: HashMap<String, NetworkSummary> = HashMap::new();
    let mut log_tick = interval(summary_log_interval);
    log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = changes_rx.recv() => {
                let Some(network_id) = changed else {
                    break;
                };
                let Some(summary) = network_summary(&registry, &slots, &network_id) else {
                    continue;
                };
                if published.get(&network_id) == Some(&summary) {
                    continue;
                }
                debug!(
                    network_id = %network_id,
                    online = summary.online,
                    offline = summary.offline,
                    alerts = summary.alerts(),
                    "network summary changed"
                );
                published.insert(network_id, summary.clone());
                let _ = events.send(MonitorEvent::NetworkSummary { summary });
            }
            _ = log_tick.tick() => {
                let fleet = summarize(
                    "*",
                    &registry
                        .assets()
                        .iter()
                        .filter_map(|a| slots.get(&a.id))
                        .map(|slot| slot.snapshot())
                        .collect::<Vec<_>>(),
                );
                info!(
                    assets = fleet.total,
                    observed = fleet.observed,
                    online = fleet.online,
                    offline = fleet.offline,
                    maintenance = fleet.maintenance,
                    anomaly = fleet.anomaly,
                    risk = fleet.risk,
                    "fleet summary"
                );
            }
        }
    }
    debug!("aggregator shutting down");
}
