// Monitor: owns the per-asset slots and poll tasks, and the aggregation worker.
// Control operations (start/stop/reconfigure/maintenance) are serialized on the task table.

mod publisher;
mod slot;

pub(crate) use publisher::Publisher;
pub(crate) use slot::AssetSlot;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::info;

use crate::aggregator::{self, AggregatorDeps};
use crate::health::classify;
use crate::models::{Asset, AssetState, MonitorEvent, NetworkSummary};
use crate::poller::{PollLoop, PollSettings, PollTask, TelemetryClient, check_endpoint};
use crate::registry::Registry;

/// Slots for every registered asset. Fixed at construction, so reads need no lock.
pub(crate) type SlotTable = HashMap<String, Arc<AssetSlot>>;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("unknown asset: {0}")]
    UnknownAsset(String),
    #[error("asset {0} has no telemetry endpoint")]
    NoEndpoint(String),
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Monitor-wide settings.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Defaults applied before each asset's own overrides.
    pub poll: PollSettings,
    pub event_capacity: usize,
    pub summary_log_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll: PollSettings::default(),
            event_capacity: 256,
            summary_log_interval: Duration::from_secs(60),
        }
    }
}

pub struct Monitor {
    registry: Arc<Registry>,
    assets: HashMap<String, Arc<Asset>>,
    slots: Arc<SlotTable>,
    tasks: Mutex<HashMap<String, PollTask>>,
    client: TelemetryClient,
    publisher: Publisher,
    events: broadcast::Sender<MonitorEvent>,
    poll: PollSettings,
    aggregator: tokio::task::JoinHandle<()>,
}

impl Monitor {
    /// Builds the monitor and spawns its aggregation worker; call from within a tokio runtime.
    /// No asset is polled until it is started.
    pub fn new(registry: Arc<Registry>, client: TelemetryClient, config: MonitorConfig) -> Self {
        let assets: HashMap<String, Arc<Asset>> = registry
            .assets()
            .iter()
            .map(|a| (a.id.clone(), Arc::new(a.clone())))
            .collect();
        let slots: Arc<SlotTable> = Arc::new(
            assets
                .iter()
                .map(|(id, a)| (id.clone(), Arc::new(AssetSlot::new(a))))
                .collect(),
        );
        let (events, _) = broadcast::channel(config.event_capacity);
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let aggregator = aggregator::spawn(
            AggregatorDeps {
                registry: registry.clone(),
                slots: slots.clone(),
                events: events.clone(),
                changes_rx,
            },
            config.summary_log_interval,
        );
        Self {
            registry,
            assets,
            slots,
            tasks: Mutex::new(HashMap::new()),
            client,
            publisher: Publisher::new(events.clone(), changes_tx),
            events,
            poll: config.poll,
            aggregator,
        }
    }

    /// Stream of samples, health/escalation changes and network summaries.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Starts polling `asset_id` at its current endpoint and returns the task's generation.
    /// Starting an asset that is already polled at the same endpoint is a no-op.
    pub async fn start(&self, asset_id: &str) -> Result<u64, MonitorError> {
        let (asset, slot) = self.lookup(asset_id)?;
        let endpoint = slot
            .endpoint()
            .ok_or_else(|| MonitorError::NoEndpoint(asset_id.to_string()))?;
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.get(asset_id)
            && task.endpoint == endpoint
        {
            return Ok(task.generation);
        }
        if let Some(task) = tasks.remove(asset_id) {
            self.halt(&asset, &slot, task).await;
        }
        Ok(self.launch(&mut tasks, asset, slot, endpoint))
    }

    /// Stops polling `asset_id`. In-flight responses are discarded. Stopping an asset that
    /// is not polled is a no-op.
    pub async fn stop(&self, asset_id: &str) -> Result<(), MonitorError> {
        let (asset, slot) = self.lookup(asset_id)?;
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.remove(asset_id) {
            self.halt(&asset, &slot, task).await;
        }
        Ok(())
    }

    /// Points `asset_id` at a new endpoint: stop, swap, start. Returns the new generation.
    pub async fn reconfigure(&self, asset_id: &str, endpoint: &str) -> Result<u64, MonitorError> {
        let (asset, slot) = self.lookup(asset_id)?;
        check_endpoint(endpoint).map_err(|reason| MonitorError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        })?;
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.remove(asset_id) {
            self.halt(&asset, &slot, task).await;
        }
        slot.set_endpoint(endpoint.to_string());
        info!(asset_id, endpoint, "endpoint reconfigured");
        Ok(self.launch(&mut tasks, asset, slot, endpoint.to_string()))
    }

    /// Starts every registered asset that has an endpoint. Returns how many are polled.
    pub async fn start_all(&self) -> usize {
        let mut started = 0;
        for asset in self.registry.assets() {
            if self.start(&asset.id).await.is_ok() {
                started += 1;
            }
        }
        started
    }

    /// Stops every poll task.
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        let ids: Vec<String> = tasks.keys().cloned().collect();
        for id in ids {
            if let (Some(task), Ok((asset, slot))) = (tasks.remove(&id), self.lookup(&id)) {
                self.halt(&asset, &slot, task).await;
            }
        }
        info!("all poll tasks stopped");
    }

    /// Sets or clears the sticky maintenance override.
    pub async fn set_maintenance(&self, asset_id: &str, enabled: bool) -> Result<(), MonitorError> {
        let (asset, slot) = self.lookup(asset_id)?;
        let tasks = self.tasks.lock().await;
        slot.request_maintenance(enabled);
        // A running poll task applies the flag itself; otherwise nobody else can write.
        if !tasks.contains_key(asset_id) {
            let change = slot.commit(slot.generation(), |state| {
                state.maintenance = enabled;
                state.health = classify(state.last_outcome, enabled);
            });
            if let Some(change) = change {
                self.publisher.changed(&asset, &change);
            }
        }
        info!(asset_id, enabled, "maintenance flag set");
        Ok(())
    }

    pub async fn is_polling(&self, asset_id: &str) -> bool {
        self.tasks.lock().await.contains_key(asset_id)
    }

    pub fn asset_state(&self, asset_id: &str) -> Option<AssetState> {
        self.slots.get(asset_id).map(|slot| slot.snapshot())
    }

    pub fn summary(&self, network_id: &str) -> Option<NetworkSummary> {
        aggregator::network_summary(&self.registry, &self.slots, network_id)
    }

    /// Summaries for every network, in registry order.
    pub fn summaries(&self) -> Vec<NetworkSummary> {
        self.registry
            .networks()
            .iter()
            .filter_map(|n| self.summary(&n.id))
            .collect()
    }

    fn lookup(&self, asset_id: &str) -> Result<(Arc<Asset>, Arc<AssetSlot>), MonitorError> {
        match (self.assets.get(asset_id), self.slots.get(asset_id)) {
            (Some(asset), Some(slot)) => Ok((asset.clone(), slot.clone())),
            _ => Err(MonitorError::UnknownAsset(asset_id.to_string())),
        }
    }

    fn launch(
        &self,
        tasks: &mut HashMap<String, PollTask>,
        asset: Arc<Asset>,
        slot: Arc<AssetSlot>,
        endpoint: String,
    ) -> u64 {
        let (generation, change) = slot.advance(true);
        self.publisher.changed(&asset, &change);
        self.publisher.network_changed(&asset.network_id);
        let settings = self.poll.with_overrides(&asset.overrides);
        let asset_id = asset.id.clone();
        let poll_loop = PollLoop::new(
            asset,
            slot,
            self.client.clone(),
            self.publisher.clone(),
            endpoint,
            settings,
            generation,
        );
        tasks.insert(asset_id, PollTask::spawn(poll_loop));
        generation
    }

    /// Invalidates the task's generation first, then stops it: a response that races the
    /// stop is rejected by the slot even if the loop has not exited yet.
    async fn halt(&self, asset: &Asset, slot: &AssetSlot, task: PollTask) {
        let stopped = task.generation;
        let (generation, change) = slot.advance(false);
        task.stop().await;
        info!(
            asset_id = %asset.id,
            stopped_generation = stopped,
            generation,
            "poll task halted"
        );
        self.publisher.changed(asset, &change);
        self.publisher.network_changed(&asset.network_id);
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().values() {
            task.abort();
        }
        self.aggregator.abort();
    }
}
