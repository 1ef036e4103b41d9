//! Allow-list masking of configuration mappings
//!
//! A mask tree mirrors the shape of the configuration. A `true` leaf keeps
//! the whole subtree at that path; a nested table recurses. Everything not
//! named in the mask is dropped. Mask paths that do not exist in the source
//! are ignored.

use serde_json::Value;

use super::ConfigMap;

/// Errors from parsing a mask tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaskError {
    #[error("mask must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("invalid mask value at '{path}': expected `true` or a mapping, found {found}")]
    InvalidLeaf { path: String, found: &'static str },
}

/// Parsed mask tree
#[derive(Debug, Clone, PartialEq)]
pub enum MaskTree {
    /// Include the subtree verbatim
    All,
    /// Include only the listed keys, in mask order
    Fields(Vec<(String, MaskTree)>),
}

impl MaskTree {
    /// Parse a mask from a JSON value. The root must be a mapping.
    pub fn from_value(value: &Value) -> Result<Self, MaskError> {
        match value {
            Value::Object(map) => Self::parse_fields(map, ""),
            other => Err(MaskError::NotAMapping {
                found: value_kind(other),
            }),
        }
    }

    fn parse_fields(map: &ConfigMap, prefix: &str) -> Result<Self, MaskError> {
        let mut fields = Vec::with_capacity(map.len());
        for (key, value) in map {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            let node = match value {
                Value::Bool(true) => MaskTree::All,
                Value::Object(inner) => Self::parse_fields(inner, &path)?,
                other => {
                    return Err(MaskError::InvalidLeaf {
                        path,
                        found: value_kind(other),
                    })
                }
            };
            fields.push((key.clone(), node));
        }
        Ok(MaskTree::Fields(fields))
    }

    /// Apply this mask to `source`, producing a new mapping.
    ///
    /// The source is never modified; kept subtrees are deep copies.
    pub fn apply(&self, source: &ConfigMap) -> ConfigMap {
        let fields = match self {
            MaskTree::All => return source.clone(),
            MaskTree::Fields(fields) => fields,
        };

        let mut output = ConfigMap::new();
        for (key, node) in fields {
            let Some(value) = source.get(key) else {
                continue;
            };
            match (node, value) {
                (MaskTree::All, value) => {
                    output.insert(key.clone(), value.clone());
                }
                (MaskTree::Fields(_), Value::Object(inner)) => {
                    output.insert(key.clone(), Value::Object(node.apply(inner)));
                }
                // Sub-mask over a scalar: nothing to select.
                (MaskTree::Fields(_), _) => {}
            }
        }
        output
    }
}

/// Parse `mask` and apply it to `source` in one step.
pub fn mask(source: &ConfigMap, mask: &Value) -> Result<ConfigMap, MaskError> {
    let tree = MaskTree::from_value(mask)?;
    Ok(tree.apply(source))
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
