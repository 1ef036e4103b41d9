//! Configuration mapping and its transforms
//!
//! The working configuration is a JSON object with insertion order kept.
//! This module holds the pure transforms applied to it:
//! - mask: allow-list projection onto a mask tree
//! - merge: deep merge where the override wins

mod mask;
mod merge;
mod value;

pub use mask::{mask, MaskError, MaskTree};
pub use merge::{deep_merge, merge_layers, merge_maps};
pub use value::{parse_json_or_toml, toml_table_to_map, toml_to_json};

pub(crate) use mask::value_kind;

/// A configuration mapping: string keys in insertion order.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;
