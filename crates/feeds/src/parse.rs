//! Lenient field decoding for loosely-specified upstream JSON.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Decode an on-chain amount written as a hex (`0x...`) or decimal string, or a JSON number.
///
/// Returns `None` for anything that is not a finite, non-negative number.
pub fn decode_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v >= 0.0),
        Value::String(s) => decode_amount_str(s),
        _ => None,
    }
}

/// String form of [`decode_amount`].
pub fn decode_amount_str(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        return u128::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Coerce a JSON number or numeric string to `f64`, defaulting to zero.
pub fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Read a string field, defaulting to empty.
pub fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Decode a timestamp given as unix seconds, unix milliseconds, or RFC 3339 text.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let secs = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
                return Some(dt.with_timezone(&Utc));
            }
            s.trim().parse::<i64>().ok()
        }
        _ => None,
    }?;
    // Values this large are milliseconds
    if secs > 1_000_000_000_000 {
        Utc.timestamp_millis_opt(secs).single()
    } else {
        Utc.timestamp_opt(secs, 0).single()
    }
}
