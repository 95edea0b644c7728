// Network-level status counts

use serde::{Deserialize, Serialize};

/// Counts over every registered asset of a network. A stopped asset keeps its last health,
/// so `online + offline + maintenance == total`; `observed` counts the assets being polled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub network_id: String,
    pub total: usize,
    pub observed: usize,
    pub online: usize,
    pub offline: usize,
    pub maintenance: usize,
    pub anomaly: usize,
    pub risk: usize,
}

impl NetworkSummary {
    /// Assets currently in `Anomaly` or `Risk`.
    pub fn alerts(&self) -> usize {
        self.anomaly + self.risk
    }
}
