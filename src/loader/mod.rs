//! Configuration loading
//!
//! The pipeline treats the loader as a black box behind [`ConfigLoader`].
//! Loaders pick their directory and deployment from two process-wide
//! environment variables; [`load_with_overrides`] is the one place that
//! changes them, and it always puts them back.

mod custom_env;
mod directory;
mod guard;

use std::path::PathBuf;

use crate::config::ConfigMap;
use crate::options::BoxError;

pub use custom_env::{apply_custom_env, CUSTOM_ENV_STEM};
pub use directory::{deployments_from, DirectoryLoader, DEFAULT_CONFIG_DIR, DEFAULT_DEPLOYMENT};
pub use guard::{load_with_overrides, CONFIG_DIR_VAR, ENV_VAR};
pub(crate) use guard::config_dir_from_env;

/// A source of configuration data.
pub trait ConfigLoader {
    /// Load the configuration. Called exactly once per pipeline run.
    fn load(&self) -> Result<LoadedConfig, LoadError>;
}

/// A contributing config file with provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    /// File path
    pub path: PathBuf,

    /// SHA-256 digest of raw file bytes
    pub digest: String,
}

/// Result of a load: plain data plus the files it came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig {
    pub data: ConfigMap,
    pub sources: Vec<ConfigSource>,
}

impl From<ConfigMap> for LoadedConfig {
    fn from(data: ConfigMap) -> Self {
        Self {
            data,
            sources: Vec::new(),
        }
    }
}

/// Loader errors
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{} must contain a mapping at the top level, found {found}", path.display())]
    NotAMapping { path: PathBuf, found: &'static str },

    #[error("invalid custom environment mapping at '{path}': {message}")]
    CustomEnv { path: String, message: String },

    #[error(transparent)]
    Other(BoxError),
}
