// Anomaly escalation: a per-asset state machine over the sample stream.
//
// Normal -> Anomaly on the first anomalous sample (window opens at the sample's time),
// Anomaly -> Risk once the window has been open for the escalation threshold,
// Risk stays Risk while anomalies continue, and any normal sample resets to Normal.
// Elapsed time comes only from sample timestamps, never from the poll cadence.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::models::EscalationState;

pub const DEFAULT_ESCALATION_THRESHOLD: Duration = Duration::from_millis(120_000);

/// Open while the asset's last known anomaly flag is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyWindow {
    pub started_at: DateTime<Utc>,
    pub escalated: bool,
}

#[derive(Debug, Clone)]
pub struct EscalationTracker {
    threshold: Duration,
    window: Option<AnomalyWindow>,
}

impl Default for EscalationTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ESCALATION_THRESHOLD)
    }
}

impl EscalationTracker {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            window: None,
        }
    }

    pub fn state(&self) -> EscalationState {
        match self.window {
            None => EscalationState::Normal,
            Some(AnomalyWindow {
                escalated: false, ..
            }) => EscalationState::Anomaly,
            Some(AnomalyWindow {
                escalated: true, ..
            }) => EscalationState::Risk,
        }
    }

    pub fn window(&self) -> Option<&AnomalyWindow> {
        self.window.as_ref()
    }

    /// Feeds one sample's anomaly flag and returns the resulting state.
    ///
    /// A sample without a flag carries no information and leaves the state untouched.
    /// A sample timestamped before the window start (clock skew) counts as zero elapsed.
    pub fn observe(&mut self, is_anomaly: Option<bool>, at: DateTime<Utc>) -> EscalationState {
        match is_anomaly {
            None => {}
            Some(false) => self.window = None,
            Some(true) => {
                let window = self.window.get_or_insert(AnomalyWindow {
                    started_at: at,
                    escalated: false,
                });
                if !window.escalated {
                    let elapsed = at
                        .signed_duration_since(window.started_at)
                        .to_std()
                        .unwrap_or(Duration::ZERO);
                    window.escalated = elapsed >= self.threshold;
                }
            }
        }
        self.state()
    }

    /// Drops any open window; used when the asset stops being observed.
    pub fn reset(&mut self) {
        self.window = None;
    }
}
