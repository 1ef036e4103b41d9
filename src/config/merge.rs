//! Deep merge for configuration mappings
//!
//! Used by the extend stage and by the directory loader to stack layers:
//! - Objects: deep-merge by key (recursive)
//! - Arrays: REPLACE (override wins entirely)
//! - Scalars: override (override wins)

use serde_json::Value;

use super::ConfigMap;

/// Deep merge two JSON values.
///
/// Merge semantics:
/// - Objects: deep-merge by key; existing keys keep their position,
///   keys only in `overlay` are appended
/// - Arrays: REPLACE (no concatenation)
/// - Scalars, nulls and type mismatches: overlay wins
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_maps(base_map, overlay_map))
        }

        // Scalars, arrays and any other case: overlay wins
        (_, overlay) => overlay,
    }
}

/// Deep merge two mappings, `overlay` taking precedence on conflicts.
///
/// Both arguments are taken by value; callers that need to keep their
/// originals pass clones.
pub fn merge_maps(mut base: ConfigMap, overlay: ConfigMap) -> ConfigMap {
    for (key, overlay_value) in overlay {
        match base.get_mut(&key) {
            // Replace in place so the key keeps its position.
            Some(slot) => {
                let base_value = slot.take();
                *slot = deep_merge(base_value, overlay_value);
            }
            None => {
                base.insert(key, overlay_value);
            }
        }
    }
    base
}

/// Merge multiple layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<ConfigMap>) -> ConfigMap {
    layers.into_iter().fold(ConfigMap::new(), merge_maps)
}
