// Domain models: registry projection, telemetry samples, derived per-asset state, events

mod asset;
mod event;
mod sample;
mod state;
mod summary;

pub use asset::{Asset, AssetKind, Network, PollOverrides, SeverityLimits, SeverityTier};
pub use event::MonitorEvent;
pub use sample::{PRESSURE_FIELDS, PayloadError, TelemetrySample, parse_payload};
pub use state::{AssetState, EscalationState, HealthStatus, PollOutcome};
pub use summary::NetworkSummary;
