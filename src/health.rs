// Health classification: poll outcome + maintenance override -> dashboard status.
// No debouncing: one failed poll is offline, one successful poll is online again.

use crate::models::{HealthStatus, PollOutcome};

/// Classifies an asset. The maintenance override wins over any poll outcome and is only
/// cleared administratively. An asset with no verdict yet is offline.
pub fn classify(last_outcome: Option<PollOutcome>, maintenance: bool) -> HealthStatus {
    if maintenance {
        return HealthStatus::Maintenance;
    }
    match last_outcome {
        Some(PollOutcome::Success) => HealthStatus::Online,
        Some(PollOutcome::Failure) | None => HealthStatus::Offline,
    }
}
