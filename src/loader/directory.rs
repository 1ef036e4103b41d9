//! Layered loading from a config directory
//!
//! Files are applied in increasing precedence:
//! 1. `default.*`
//! 2. `{deployment}.*` for each deployment
//! 3. `local.*`
//! 4. `local-{deployment}.*` for each deployment
//! 5. `custom-environment-variables.*` (values taken from the environment)
//!
//! Each stem may exist as `.json`, `.toml`, `.yaml` or `.yml`. Missing
//! files are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::custom_env::{apply_custom_env, CUSTOM_ENV_STEM};
use super::guard::{CONFIG_DIR_VAR, ENV_VAR};
use super::{ConfigLoader, ConfigSource, LoadError, LoadedConfig};
use crate::config::{merge_layers, toml_table_to_map, value_kind, ConfigMap};

/// Directory used when `NODE_CONFIG_DIR` is unset
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Deployment used when `NODE_ENV` is unset
pub const DEFAULT_DEPLOYMENT: &str = "development";

/// Extensions tried for every stem, in application order
const EXTENSIONS: &[&str] = &["json", "toml", "yaml", "yml"];

/// Loads a config directory chosen by `NODE_CONFIG_DIR` and `NODE_ENV`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryLoader;

impl DirectoryLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load `dir` for the given deployments, bypassing the environment
    /// lookup of the directory and deployment.
    pub fn load_from(dir: &Path, deployments: &[String]) -> Result<LoadedConfig, LoadError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        for stem in layer_stems(deployments) {
            for (layer, source) in load_stem(dir, &stem)? {
                layers.push(layer);
                sources.push(source);
            }
        }

        for (mapping, source) in load_stem(dir, CUSTOM_ENV_STEM)? {
            layers.push(apply_custom_env(&mapping, &|name| std::env::var(name).ok())?);
            sources.push(source);
        }

        if sources.is_empty() {
            warn!(dir = %dir.display(), "no config files found in config directory");
        }

        Ok(LoadedConfig {
            data: merge_layers(layers),
            sources,
        })
    }
}

impl ConfigLoader for DirectoryLoader {
    fn load(&self) -> Result<LoadedConfig, LoadError> {
        let dir = std::env::var_os(CONFIG_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
        let deployments = deployments_from(std::env::var(ENV_VAR).ok().as_deref());

        debug!(dir = %dir.display(), ?deployments, "loading config directory");
        Self::load_from(&dir, &deployments)
    }
}

/// Split a deployment value into its parts.
///
/// A comma-separated value names several deployments, applied in order.
/// Unset or blank values fall back to [`DEFAULT_DEPLOYMENT`].
pub fn deployments_from(value: Option<&str>) -> Vec<String> {
    let deployments: Vec<String> = value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if deployments.is_empty() {
        vec![DEFAULT_DEPLOYMENT.to_string()]
    } else {
        deployments
    }
}

fn layer_stems(deployments: &[String]) -> Vec<String> {
    let mut stems = vec!["default".to_string()];
    stems.extend(deployments.iter().cloned());
    stems.push("local".to_string());
    stems.extend(deployments.iter().map(|d| format!("local-{}", d)));
    stems
}

/// Load every existing file for `stem`, in extension order.
fn load_stem(dir: &Path, stem: &str) -> Result<Vec<(ConfigMap, ConfigSource)>, LoadError> {
    let mut layers = Vec::new();
    for ext in EXTENSIONS {
        let path = dir.join(format!("{}.{}", stem, ext));
        if !path.is_file() {
            continue;
        }
        layers.push(load_file(&path)?);
    }
    Ok(layers)
}

/// Read and parse one config file, returning the mapping and its provenance.
fn load_file(path: &Path) -> Result<(ConfigMap, ConfigSource), LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        message: format!("invalid UTF-8: {}", e),
    })?;

    let value = if contents.trim().is_empty() {
        Value::Object(ConfigMap::new())
    } else {
        parse_contents(path, &contents)?
    };

    let data = match value {
        Value::Object(map) => map,
        // An empty YAML document parses as null.
        Value::Null => ConfigMap::new(),
        other => {
            return Err(LoadError::NotAMapping {
                path: path.to_path_buf(),
                found: value_kind(&other),
            })
        }
    };

    debug!(path = %path.display(), %digest, "loaded config file");
    Ok((
        data,
        ConfigSource {
            path: path.to_path_buf(),
            digest,
        },
    ))
}

fn parse_contents(path: &Path, contents: &str) -> Result<Value, LoadError> {
    let parse_error = |message: String| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(contents).map_err(|e| parse_error(e.to_string())),
        Some("toml") => toml::from_str::<toml::Table>(contents)
            .map(|table| Value::Object(toml_table_to_map(table)))
            .map_err(|e| parse_error(e.message().to_string())),
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string()))
        }
        _ => Err(parse_error("unsupported file extension".to_string())),
    }
}
