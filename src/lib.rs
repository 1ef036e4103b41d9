//! masked-config - build-time configuration transformer
//!
//! Loads a layered configuration directory, keeps only the allow-listed
//! keys, merges in extra values, optionally runs a user transform and
//! writes the result as an ES6 or CommonJS module for the rest of the
//! build to import.
//!
//! ```no_run
//! use masked_config::{MaskedConfig, Options};
//! use serde_json::json;
//!
//! let options = Options::new()
//!     .with_source("./config")
//!     .with_mask(json!({"api": true, "features": {"search": true}}))
//!     .with_target("./src/generated/config.js");
//!
//! MaskedConfig::new(options).run_in_current_dir()?;
//! # Ok::<(), masked_config::PipelineError>(())
//! ```

pub mod config;
pub mod loader;
pub mod log;
pub mod options;
pub mod paths;
pub mod pipeline;
pub mod writer;

pub use config::{ConfigMap, MaskError, MaskTree};
pub use loader::{ConfigLoader, DirectoryLoader, LoadError, LoadedConfig};
pub use log::{LogSink, TracingSink};
pub use options::{BoxError, Options, OptionsError, OptionsFile};
pub use pipeline::{MaskedConfig, PipelineError, PipelineResult, Stage};
pub use writer::{ExportFormat, UnsupportedFormatError};
