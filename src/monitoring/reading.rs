//! Temperature extraction from vendor status payloads

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::FetchError;

/// Reading field names, highest priority first
pub const TEMPERATURE_KEYS: [&str; 6] = [
    "va_temperature",
    "current_temperature",
    "temperature",
    "temp",
    "current_temp",
    "va_temp",
];

/// Unit field names, highest priority first
pub const UNIT_KEYS: [&str; 2] = ["temp_unit_convert", "temp_unit"];

/// Unit reported when the payload declares none
pub const DEFAULT_UNIT: &str = "c";

/// Raw values at or above this are fixed-point tenths
const TENTHS_THRESHOLD: f64 = 100.0;

/// Device status flattened to `code -> value`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStatus(Map<String, Value>);

impl RawStatus {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Normalise a vendor payload
    ///
    /// Accepts either an object, returned as-is, or an array of
    /// `{"code": .., "value": ..}` entries, folded into an object. Array
    /// entries without a string `code` or with a null `value` are dropped.
    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Array(items) => {
                let mut map = Map::new();
                for item in items {
                    let code = item.get("code").and_then(Value::as_str);
                    let value = item.get("value").filter(|v| !v.is_null());
                    if let (Some(code), Some(value)) = (code, value) {
                        map.insert(code.to_string(), value.clone());
                    }
                }
                Ok(Self(map))
            }
            other => Err(FetchError::Malformed(format!(
                "expected object or array, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// A single temperature sample
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Value as reported by the device
    pub raw: f64,
    /// Declared unit (`c` when absent)
    pub unit: String,
    pub celsius: f64,
}

impl Reading {
    pub fn new(raw: f64, unit: impl Into<String>) -> Self {
        Self {
            raw,
            unit: unit.into(),
            celsius: normalize_celsius(raw),
        }
    }
}

/// Vendor APIs scale inconsistently: values >= 100 are tenths of a degree
pub fn normalize_celsius(raw: f64) -> f64 {
    if raw >= TENTHS_THRESHOLD {
        raw / 10.0
    } else {
        raw
    }
}

/// Probe the known reading fields; `None` when the payload has no temperature
pub fn extract_reading(status: &RawStatus) -> Option<Reading> {
    let raw = TEMPERATURE_KEYS
        .iter()
        .find_map(|key| status.get(key).and_then(as_number))?;

    let unit = UNIT_KEYS
        .iter()
        .find_map(|key| status.get(key).and_then(as_unit))
        .unwrap_or_else(|| DEFAULT_UNIT.to_string());

    Some(Reading::new(raw, unit))
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn as_unit(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
