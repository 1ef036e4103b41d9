//! Per-invocation options
//!
//! Every field except `target` and `export_format` is optional; leaving one
//! unset skips the matching pipeline stage.

mod file;

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::ConfigMap;
use crate::log::{LogSink, TracingSink};
use crate::writer::ExportFormat;

pub use file::{OptionsError, OptionsFile, DEFAULT_OPTIONS_FILE};

/// Boxed error returned by user callbacks and custom loaders
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// User transform applied after masking and extending
pub type MorphFn = dyn Fn(ConfigMap) -> Result<ConfigMap, BoxError>;

/// Default target path, relative to the working directory
pub const DEFAULT_TARGET: &str = "./config.js";

/// Options for one pipeline run
pub struct Options {
    pub(crate) debug: bool,
    pub(crate) log: Box<dyn LogSink>,
    pub(crate) source: Option<PathBuf>,
    pub(crate) env: Option<String>,
    pub(crate) mask: Option<Value>,
    pub(crate) extend: Option<Value>,
    pub(crate) morph: Option<Box<MorphFn>>,
    pub(crate) target: PathBuf,
    pub(crate) export_format: ExportFormat,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: false,
            log: Box::new(TracingSink),
            source: None,
            env: None,
            mask: None,
            extend: None,
            morph: None,
            target: PathBuf::from(DEFAULT_TARGET),
            export_format: ExportFormat::default(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trace each step through the log sink
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_log(mut self, log: impl LogSink + 'static) -> Self {
        self.log = Box::new(log);
        self
    }

    /// Config directory, relative to the working directory
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Deployment to load instead of the ambient one
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    /// Allow-list mask; leaves must be `true`
    pub fn with_mask(mut self, mask: Value) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Values deep-merged over the (masked) configuration
    pub fn with_extend(mut self, extend: Value) -> Self {
        self.extend = Some(extend);
        self
    }

    /// Final transform; its result replaces the configuration
    pub fn with_morph<F>(mut self, morph: F) -> Self
    where
        F: Fn(ConfigMap) -> Result<ConfigMap, BoxError> + 'static,
    {
        self.morph = Some(Box::new(morph));
        self
    }

    /// Output path, relative to the working directory
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_export_format(mut self, format: ExportFormat) -> Self {
        self.export_format = format;
        self
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub fn env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn target(&self) -> &PathBuf {
        &self.target
    }

    pub fn export_format(&self) -> ExportFormat {
        self.export_format
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("debug", &self.debug)
            .field("source", &self.source)
            .field("env", &self.env)
            .field("mask", &self.mask)
            .field("extend", &self.extend)
            .field("morph", &self.morph.as_ref().map(|_| "<fn>"))
            .field("target", &self.target)
            .field("export_format", &self.export_format)
            .finish_non_exhaustive()
    }
}
