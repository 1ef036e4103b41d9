//! Scoped overrides of the loader's environment variables

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{ConfigLoader, LoadError, LoadedConfig};

/// Variable naming the config directory
pub const CONFIG_DIR_VAR: &str = "NODE_CONFIG_DIR";

/// Variable naming the deployment (environment tag)
pub const ENV_VAR: &str = "NODE_ENV";

/// Held for the whole load so overlapping runs in one process cannot
/// observe each other's overrides.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Sets an environment variable and restores its previous state on drop.
struct EnvOverride {
    name: &'static str,
    previous: Option<OsString>,
}

impl EnvOverride {
    fn set(name: &'static str, value: impl AsRef<OsStr>) -> Self {
        let previous = std::env::var_os(name);
        std::env::set_var(name, value);
        Self { name, previous }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => std::env::set_var(self.name, value),
            None => std::env::remove_var(self.name),
        }
    }
}

/// Run `loader` once with the config directory and deployment overridden.
///
/// Both variables are restored on every exit path, including errors and
/// panics inside the loader.
pub fn load_with_overrides(
    loader: &dyn ConfigLoader,
    config_dir: Option<&Path>,
    env_tag: Option<&str>,
) -> Result<LoadedConfig, LoadError> {
    let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let _dir = config_dir.map(|dir| EnvOverride::set(CONFIG_DIR_VAR, dir));
    let _env = env_tag.map(|tag| EnvOverride::set(ENV_VAR, tag));

    loader.load()
}

/// The config directory variable as set outside any in-flight load.
pub(crate) fn config_dir_from_env() -> Option<PathBuf> {
    let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    std::env::var_os(CONFIG_DIR_VAR)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}
