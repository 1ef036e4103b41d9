//! Environment-variable overrides declared in `custom-environment-variables.*`
//!
//! The file mirrors the config shape; each leaf names the variable that
//! supplies the value at that path:
//!
//! ```toml
//! [db]
//! password = "DB_PASSWORD"
//!
//! [db.pool]
//! __name = "DB_POOL"
//! __format = "json"
//! ```

use serde_json::Value;

use super::LoadError;
use crate::config::{value_kind, ConfigMap};

/// File stem of the custom environment mapping
pub const CUSTOM_ENV_STEM: &str = "custom-environment-variables";

/// Build the overrides described by `mapping`, reading variables via `lookup`.
///
/// Only paths whose variable is set to a non-empty value appear in the result.
pub fn apply_custom_env(
    mapping: &ConfigMap,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<ConfigMap, LoadError> {
    collect(mapping, "", lookup)
}

fn collect(
    mapping: &ConfigMap,
    prefix: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<ConfigMap, LoadError> {
    let mut overrides = ConfigMap::new();

    for (key, entry) in mapping {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        let value = match entry {
            Value::String(name) => read_var(lookup, name).map(Value::String),
            Value::Object(inner) if inner.contains_key("__name") => {
                read_formatted(inner, &path, lookup)?
            }
            Value::Object(inner) => {
                let nested = collect(inner, &path, lookup)?;
                (!nested.is_empty()).then_some(Value::Object(nested))
            }
            other => {
                return Err(LoadError::CustomEnv {
                    path,
                    message: format!("expected a variable name, found {}", value_kind(other)),
                })
            }
        };

        if let Some(value) = value {
            overrides.insert(key.clone(), value);
        }
    }

    Ok(overrides)
}

fn read_var(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.is_empty())
}

fn read_formatted(
    entry: &ConfigMap,
    path: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<Option<Value>, LoadError> {
    let invalid = |message: String| LoadError::CustomEnv {
        path: path.to_string(),
        message,
    };

    let name = entry
        .get("__name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("`__name` must be a string".to_string()))?;

    let Some(raw) = read_var(lookup, name) else {
        return Ok(None);
    };

    match entry.get("__format").and_then(Value::as_str) {
        None => Ok(Some(Value::String(raw))),
        Some("json") => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| invalid(format!("variable {} is not valid JSON: {}", name, e))),
        Some(other) => Err(invalid(format!("unsupported `__format` '{}'", other))),
    }
}
