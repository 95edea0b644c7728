// Telemetry sample and endpoint payload parsing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SeverityTier;

/// Field names devices have used for the pressure reading over time, in lookup order.
pub const PRESSURE_FIELDS: [&str; 3] = ["pressure", "pressao", "nova_pressao"];

/// One parsed reading from an asset's endpoint. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub asset_id: String,
    pub pressure: f64,
    pub is_anomaly: Option<bool>,
    /// Reconstruction error reported by the external detector.
    pub mse: Option<f64>,
    /// Detector's own decision threshold for `mse`.
    pub threshold: Option<f64>,
    pub observed_at: DateTime<Utc>,
    /// Tier of `pressure` against the asset's limits; `None` when no limits are configured.
    #[serde(default)]
    pub tier: Option<SeverityTier>,
    #[serde(default)]
    pub over_max_pressure: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("body is not a JSON object")]
    NotAnObject,
    #[error("no recognizable pressure field (expected one of {PRESSURE_FIELDS:?})")]
    MissingPressure,
}

/// Parses an endpoint body into a sample. `tier` and `over_max_pressure` are left for
/// the caller, which knows the asset's limits.
pub fn parse_payload(
    asset_id: &str,
    body: &[u8],
    observed_at: DateTime<Utc>,
) -> Result<TelemetrySample, PayloadError> {
    let value: Value = serde_json::from_slice(body)?;
    let Value::Object(map) = value else {
        return Err(PayloadError::NotAnObject);
    };

    let pressure = PRESSURE_FIELDS
        .iter()
        .find_map(|field| map.get(*field).and_then(number))
        .ok_or(PayloadError::MissingPressure)?;

    Ok(TelemetrySample {
        asset_id: asset_id.to_string(),
        pressure,
        is_anomaly: flag(&map, "is_anomaly"),
        mse: map.get("mse").and_then(number),
        threshold: map.get("threshold").and_then(number),
        observed_at,
        tier: None,
        over_max_pressure: false,
    })
}

/// Finite number, or a string holding one (some firmware stringifies readings).
fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn flag(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
