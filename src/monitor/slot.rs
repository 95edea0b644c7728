// Committed per-asset state behind a watch channel.
// Every write names the generation it was issued under; the generation check and the write
// happen under the channel's lock, so a superseded poll task can never land a result.

use tokio::sync::watch;

use crate::health::classify;
use crate::models::{Asset, AssetState, EscalationState, HealthStatus};

/// What a committed write changed, for event publishing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Change {
    pub(crate) health: Option<HealthStatus>,
    pub(crate) escalation: Option<EscalationState>,
}

impl Change {
    pub(crate) fn is_empty(&self) -> bool {
        self.health.is_none() && self.escalation.is_none()
    }
}

pub(crate) struct AssetSlot {
    state: watch::Sender<AssetState>,
    maintenance: watch::Sender<bool>,
}

impl AssetSlot {
    pub(crate) fn new(asset: &Asset) -> Self {
        let (state, _) = watch::channel(AssetState {
            asset_id: asset.id.clone(),
            network_id: asset.network_id.clone(),
            endpoint: asset.telemetry_endpoint.clone(),
            observed: false,
            generation: 0,
            maintenance: asset.maintenance,
            last_outcome: None,
            health: classify(None, asset.maintenance),
            escalation: EscalationState::Normal,
            anomaly_since: None,
            last_sample: None,
        });
        let (maintenance, _) = watch::channel(asset.maintenance);
        Self { state, maintenance }
    }

    /// Copy of the last committed state. Never observes a half-applied write.
    pub(crate) fn snapshot(&self) -> AssetState {
        self.state.borrow().clone()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    pub(crate) fn endpoint(&self) -> Option<String> {
        self.state.borrow().endpoint.clone()
    }

    pub(crate) fn maintenance_rx(&self) -> watch::Receiver<bool> {
        self.maintenance.subscribe()
    }

    /// Records the requested maintenance flag for the owning poll task to pick up.
    pub(crate) fn request_maintenance(&self, enabled: bool) {
        self.maintenance.send_replace(enabled);
    }

    /// Only valid while no poll task owns the slot.
    pub(crate) fn set_endpoint(&self, endpoint: String) {
        self.state.send_modify(|s| s.endpoint = Some(endpoint));
    }

    /// Starts a new generation, invalidating all writes issued under older ones. The anomaly
    /// window belonged to the previous poll task, so escalation goes back to normal.
    /// A maintenance request the old task never applied is taken over here.
    pub(crate) fn advance(&self, observed: bool) -> (u64, Change) {
        let maintenance = *self.maintenance.borrow();
        let mut out = (0, Change::default());
        self.state.send_modify(|s| {
            s.generation += 1;
            s.observed = observed;
            let health = s.health;
            s.maintenance = maintenance;
            s.health = classify(s.last_outcome, maintenance);
            if s.health != health {
                out.1.health = Some(s.health);
            }
            if s.escalation != EscalationState::Normal {
                out.1.escalation = Some(EscalationState::Normal);
            }
            s.escalation = EscalationState::Normal;
            s.anomaly_since = None;
            out.0 = s.generation;
        });
        out
    }

    /// Applies `apply` if the slot is still at `generation`. Returns `None` when the write
    /// was rejected as stale.
    pub(crate) fn commit<F>(&self, generation: u64, apply: F) -> Option<Change>
    where
        F: FnOnce(&mut AssetState),
    {
        let mut change = None;
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            let (health, escalation) = (s.health, s.escalation);
            apply(s);
            change = Some(Change {
                health: (s.health != health).then_some(s.health),
                escalation: (s.escalation != escalation).then_some(s.escalation),
            });
            true
        });
        change
    }
}
