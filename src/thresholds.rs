// Pressure severity tiers against operator-configured limits

use crate::models::{SeverityLimits, SeverityTier};

/// Tier of `pressure` against `limits`.
///
/// The chosen tier is the one whose limit is the greatest configured limit <= `pressure`
/// (lower bounds are inclusive). Readings below every limit fall into the lowest configured
/// tier; readings above the highest limit stay in the highest configured tier.
/// Returns `None` when no limit is configured or the reading is not finite.
pub fn severity_tier(pressure: f64, limits: &SeverityLimits) -> Option<SeverityTier> {
    if !pressure.is_finite() {
        return None;
    }
    let mut configured = limits.configured().peekable();
    let (lowest, _) = *configured.peek()?;
    let reached = configured
        .filter(|(_, limit)| pressure >= *limit)
        .map(|(tier, _)| tier)
        .last();
    Some(reached.unwrap_or(lowest))
}

/// True when `max_pressure` is configured and the reading exceeds it.
pub fn exceeds_max_pressure(pressure: f64, max_pressure: Option<f64>) -> bool {
    max_pressure.is_some_and(|max| pressure > max)
}
