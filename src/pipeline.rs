//! Transform pipeline
//!
//! One run walks a fixed sequence of stages:
//! - Load the configuration (always)
//! - Mask it (when a mask is set)
//! - Extend it (when extend values are set)
//! - Morph it (when a morph function is set)
//! - Serialize it to the target file
//!
//! Each failure is logged once through the options' sink with a message
//! naming the stage, then returned. Nothing is written unless every
//! earlier stage succeeded.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::{mask, merge_maps, value_kind, ConfigMap, MaskError};
use crate::loader::{
    config_dir_from_env, load_with_overrides, ConfigLoader, DirectoryLoader, LoadError,
    DEFAULT_CONFIG_DIR,
};
use crate::options::{BoxError, Options};
use crate::paths;
use crate::writer::{write_config, UnsupportedFormatError, WriteError};

/// Prefix of every message sent to the log sink
const LOG_PREFIX: &str = "masked-config:";

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Mask,
    Extend,
    Morph,
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Mask => "mask",
            Stage::Extend => "extend",
            Stage::Morph => "morph",
            Stage::Serialize => "serialize",
        };
        f.write_str(name)
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to resolve the path '{}': {source}", path.display())]
    PathResolution {
        stage: Stage,
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to load the configuration: {0}")]
    ConfigLoad(#[source] LoadError),

    #[error("failed to mask the configuration object: {0}")]
    Mask(#[source] MaskError),

    #[error("failed to extend the configuration object: extend must be a mapping, found {found}")]
    Extend { found: &'static str },

    #[error("failed to morph the configuration object: {0}")]
    Morph(#[source] BoxError),

    #[error("failed to create the target directory '{}': {source}", path.display())]
    DirectoryCreation { path: PathBuf, source: io::Error },

    #[error("{0}")]
    UnsupportedFormat(#[from] UnsupportedFormatError),

    #[error("failed to write the config file '{}': {source}", path.display())]
    FileWrite { path: PathBuf, source: io::Error },
}

impl PipelineError {
    /// The stage that failed
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::PathResolution { stage, .. } => *stage,
            PipelineError::ConfigLoad(_) => Stage::Load,
            PipelineError::Mask(_) => Stage::Mask,
            PipelineError::Extend { .. } => Stage::Extend,
            PipelineError::Morph(_) => Stage::Morph,
            PipelineError::DirectoryCreation { .. }
            | PipelineError::UnsupportedFormat(_)
            | PipelineError::FileWrite { .. } => Stage::Serialize,
        }
    }
}

impl From<WriteError> for PipelineError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::DirectoryCreation { path, source } => {
                PipelineError::DirectoryCreation { path, source }
            }
            WriteError::FileWrite { path, source } => PipelineError::FileWrite { path, source },
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// A configured transform, ready to run.
pub struct MaskedConfig {
    options: Options,
    loader: Box<dyn ConfigLoader>,
}

impl MaskedConfig {
    /// Create a pipeline that loads with [`DirectoryLoader`].
    pub fn new(options: Options) -> Self {
        Self::with_loader(options, DirectoryLoader::new())
    }

    /// Create a pipeline with a custom loader.
    pub fn with_loader(options: Options, loader: impl ConfigLoader + 'static) -> Self {
        Self {
            options,
            loader: Box::new(loader),
        }
    }

    /// Run against the process's current directory.
    pub fn run_in_current_dir(&self) -> PipelineResult<PathBuf> {
        let cwd = std::env::current_dir().map_err(|source| PipelineError::PathResolution {
            stage: Stage::Load,
            path: PathBuf::from("."),
            source,
        });
        match cwd {
            Ok(cwd) => self.run(&cwd),
            Err(err) => Err(self.report(err)),
        }
    }

    /// Run every stage once, with paths relative to `working_dir`.
    ///
    /// Returns the resolved path of the written file.
    pub fn run(&self, working_dir: &Path) -> PipelineResult<PathBuf> {
        self.execute(working_dir).map_err(|err| self.report(err))
    }

    fn report(&self, err: PipelineError) -> PipelineError {
        self.options
            .log
            .error(&format!("{} {} stage failed: {}", LOG_PREFIX, err.stage(), err));
        err
    }

    fn execute(&self, working_dir: &Path) -> PipelineResult<PathBuf> {
        let options = &self.options;
        self.trace(|| format!("options: {:?}", options));

        let mut config = self.load(working_dir)?;
        self.trace(|| format!("- original: {}", to_json(&config)));

        if let Some(mask_tree) = &options.mask {
            config = mask(&config, mask_tree).map_err(PipelineError::Mask)?;
            self.trace(|| format!("- masked: {}", to_json(&config)));
        }

        if let Some(extend) = &options.extend {
            let Value::Object(extend) = extend else {
                return Err(PipelineError::Extend {
                    found: value_kind(extend),
                });
            };
            config = merge_maps(config, extend.clone());
            self.trace(|| format!("- extended: {}", to_json(&config)));
        }

        if let Some(morph) = &options.morph {
            // The callback owns its input; the pipeline keeps no alias to it.
            config = morph(config).map_err(PipelineError::Morph)?;
            self.trace(|| format!("- morphed: {}", to_json(&config)));
        }

        let target = self.resolve(working_dir, &options.target, Stage::Serialize)?;
        self.trace(|| format!("- saved as: {}", target.display()));

        write_config(&config, &target, options.export_format)?;
        Ok(target)
    }

    fn load(&self, working_dir: &Path) -> PipelineResult<ConfigMap> {
        // A relative directory, whether configured or inherited from the
        // environment, is relative to `working_dir`.
        let dir = match &self.options.source {
            Some(source) => source.clone(),
            None => config_dir_from_env().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
        };
        let source = self.resolve(working_dir, &dir, Stage::Load)?;

        let loaded = load_with_overrides(
            self.loader.as_ref(),
            Some(&source),
            self.options.env.as_deref(),
        )
        .map_err(PipelineError::ConfigLoad)?;

        for file in &loaded.sources {
            tracing::debug!(path = %file.path.display(), digest = %file.digest, "config source");
        }
        Ok(loaded.data)
    }

    fn resolve(&self, working_dir: &Path, path: &Path, stage: Stage) -> PipelineResult<PathBuf> {
        paths::resolve(working_dir, path).map_err(|source| PipelineError::PathResolution {
            stage,
            path: path.to_path_buf(),
            source,
        })
    }

    fn trace(&self, message: impl FnOnce() -> String) {
        if self.options.debug {
            self.options
                .log
                .debug(&format!("{} {}", LOG_PREFIX, message()));
        }
    }
}

impl fmt::Debug for MaskedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskedConfig")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn to_json(config: &ConfigMap) -> String {
    serde_json::to_string(config).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadedConfig, CONFIG_DIR_VAR};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct FixedLoader(Value);

    impl ConfigLoader for FixedLoader {
        fn load(&self) -> Result<LoadedConfig, LoadError> {
            Ok(LoadedConfig::from(self.0.as_object().cloned().unwrap_or_default()))
        }
    }

    /// Records the config directory visible to the loader.
    struct DirRecordingLoader(Rc<RefCell<Option<PathBuf>>>);

    impl ConfigLoader for DirRecordingLoader {
        fn load(&self) -> Result<LoadedConfig, LoadError> {
            *self.0.borrow_mut() = std::env::var_os(CONFIG_DIR_VAR).map(PathBuf::from);
            Ok(LoadedConfig::from(ConfigMap::new()))
        }
    }

    struct FailingLoader;

    impl ConfigLoader for FailingLoader {
        fn load(&self) -> Result<LoadedConfig, LoadError> {
            Err(LoadError::Other("loader exploded".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        debug: RefCell<Vec<String>>,
        error: RefCell<Vec<String>>,
    }

    impl crate::log::LogSink for RecordingSink {
        fn debug(&self, message: &str) {
            self.debug.borrow_mut().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.error.borrow_mut().push(message.to_string());
        }
    }

    fn case_1() -> Value {
        json!({
            "val_1": 123,
            "val_2": 456,
            "obj_A": {"val_A1": "abc", "val_A2": "def"}
        })
    }

    fn read_literal(path: &Path) -> Value {
        let text = std::fs::read_to_string(path).unwrap();
        let start = text.find('{').unwrap();
        let end = text.rfind('}').unwrap();
        serde_json::from_str(&text[start..=end]).unwrap()
    }

    #[test]
    fn test_stage_order_and_traces() {
        let dir = TempDir::new().unwrap();
        let sink = Rc::new(RecordingSink::default());
        let options = Options::new()
            .with_debug(true)
            .with_log(sink.clone())
            .with_mask(json!({"val_1": true, "obj_A": {"val_A2": true}}))
            .with_extend(json!({"val_3": 789, "obj_A": {"val_A3": "ghi"}}))
            .with_morph(|mut config| {
                config.insert("val_2".to_string(), json!("new_val_2"));
                Ok(config)
            })
            .with_target("out/config.js");

        let target = MaskedConfig::with_loader(options, FixedLoader(case_1()))
            .run(dir.path())
            .unwrap();

        assert_eq!(target, dir.path().join("out/config.js"));
        assert_eq!(
            read_literal(&target),
            json!({
                "val_1": 123,
                "obj_A": {"val_A2": "def", "val_A3": "ghi"},
                "val_3": 789,
                "val_2": "new_val_2"
            })
        );

        let debug = sink.debug.borrow();
        assert_eq!(debug.len(), 6);
        assert!(debug[0].starts_with("masked-config: options:"));
        assert!(debug[1].starts_with("masked-config: - original:"));
        assert!(debug[2].starts_with("masked-config: - masked:"));
        assert!(debug[3].starts_with("masked-config: - extended:"));
        assert!(debug[4].starts_with("masked-config: - morphed:"));
        assert!(debug[5].starts_with("masked-config: - saved as:"));
        assert!(sink.error.borrow().is_empty());
    }

    #[test]
    fn test_no_traces_without_debug() {
        let dir = TempDir::new().unwrap();
        let sink = Rc::new(RecordingSink::default());
        let options = Options::new().with_log(sink.clone());

        MaskedConfig::with_loader(options, FixedLoader(case_1()))
            .run(dir.path())
            .unwrap();

        assert!(sink.debug.borrow().is_empty());
    }

    #[test]
    fn test_load_failure_is_logged_and_nothing_written() {
        let dir = TempDir::new().unwrap();
        let sink = Rc::new(RecordingSink::default());
        let options = Options::new().with_log(sink.clone());

        let err = MaskedConfig::with_loader(options, FailingLoader)
            .run(dir.path())
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Load);
        assert!(matches!(err, PipelineError::ConfigLoad(_)));
        assert!(!dir.path().join("config.js").exists());

        let errors = sink.error.borrow();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("load stage failed"));
        assert!(errors[0].contains("loader exploded"));
    }

    #[test]
    fn test_malformed_mask() {
        let dir = TempDir::new().unwrap();
        let options = Options::new()
            .with_log(RecordingSink::default())
            .with_mask(json!({"val_1": "yes"}));

        let err = MaskedConfig::with_loader(options, FixedLoader(case_1()))
            .run(dir.path())
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Mask);
        assert!(err.to_string().contains("val_1"));
        assert!(!dir.path().join("config.js").exists());
    }

    #[test]
    fn test_extend_must_be_mapping() {
        let dir = TempDir::new().unwrap();
        let options = Options::new()
            .with_log(RecordingSink::default())
            .with_extend(json!([1, 2]));

        let err = MaskedConfig::with_loader(options, FixedLoader(case_1()))
            .run(dir.path())
            .unwrap_err();

        assert!(matches!(err, PipelineError::Extend { found: "array" }));
        assert!(!dir.path().join("config.js").exists());
    }

    #[test]
    fn test_morph_failure() {
        let dir = TempDir::new().unwrap();
        let sink = Rc::new(RecordingSink::default());
        let options = Options::new()
            .with_log(sink.clone())
            .with_morph(|_| Err("bad morph".into()));

        let err = MaskedConfig::with_loader(options, FixedLoader(case_1()))
            .run(dir.path())
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Morph);
        assert!(err.to_string().contains("bad morph"));
        assert!(sink.error.borrow()[0].contains("morph stage failed"));
        assert!(!dir.path().join("config.js").exists());
    }

    #[test]
    fn test_empty_source_path_fails_resolution() {
        let dir = TempDir::new().unwrap();
        let options = Options::new()
            .with_log(RecordingSink::default())
            .with_source("");

        let err = MaskedConfig::with_loader(options, FixedLoader(case_1()))
            .run(dir.path())
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::PathResolution { stage: Stage::Load, .. }
        ));
    }

    #[test]
    fn test_default_config_dir_is_relative_to_working_dir() {
        let dir = TempDir::new().unwrap();
        let seen = Rc::new(RefCell::new(None));
        let options = Options::new().with_log(RecordingSink::default());

        MaskedConfig::with_loader(options, DirRecordingLoader(seen.clone()))
            .run(dir.path())
            .unwrap();

        assert_eq!(*seen.borrow(), Some(dir.path().join(DEFAULT_CONFIG_DIR)));
    }

    #[test]
    fn test_error_messages_name_stage() {
        let err = PipelineError::Extend { found: "string" };
        assert_eq!(
            err.to_string(),
            "failed to extend the configuration object: extend must be a mapping, found string"
        );
        assert_eq!(err.stage(), Stage::Extend);

        let err = PipelineError::from(UnsupportedFormatError("amd".to_string()));
        assert_eq!(err.stage(), Stage::Serialize);
    }
}
