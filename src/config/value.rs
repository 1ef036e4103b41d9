//! Conversions from the supported file formats into configuration values

use serde_json::Value;

use super::ConfigMap;

/// Convert a TOML value into a JSON value.
///
/// Datetimes have no JSON counterpart and are rendered as strings.
pub fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(toml_table_to_map(table)),
    }
}

/// Convert a TOML table into a configuration mapping, keeping key order.
pub fn toml_table_to_map(table: toml::Table) -> ConfigMap {
    table
        .into_iter()
        .map(|(k, v)| (k, toml_to_json(v)))
        .collect()
}

/// Parse a JSON value from either inline JSON text or TOML text.
///
/// JSON is tried first; TOML documents must be tables.
pub fn parse_json_or_toml(text: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(json_err) => match toml::from_str::<toml::Table>(text) {
            Ok(table) => Ok(Value::Object(toml_table_to_map(table))),
            Err(toml_err) => Err(format!(
                "not valid JSON ({}) or TOML ({})",
                json_err,
                toml_err.message()
            )),
        },
    }
}
