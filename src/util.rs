//! Small input-coercion helpers for form-encoded payloads
//!
//! Browser forms post numbers as strings ("50000") and empty inputs as "".
//! These helpers accept either representation.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a finite number, accepting numeric strings
pub fn lenient_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.replace(',', "").parse::<f64>().ok()
            }
        }
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Serde adapter: optional number that may arrive as a string or be empty
pub fn de_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(lenient_number))
}

/// Serde adapter: optional non-negative integer that may arrive as a string
pub fn de_lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(lenient_number)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32))
}
