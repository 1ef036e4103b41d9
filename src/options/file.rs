//! Options file (`masked-config.toml`)
//!
//! ```toml
//! source = "./config"
//! env = "production"
//! target = "./src/generated/config.js"
//! export_format = "commonjs"
//!
//! [mask]
//! api = true
//! [mask.features]
//! search = true
//!
//! [extend]
//! build_id = "local"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use super::Options;
use crate::config::toml_table_to_map;
use crate::writer::{ExportFormat, UnsupportedFormatError};

/// Options file picked up from the working directory when present
pub const DEFAULT_OPTIONS_FILE: &str = "masked-config.toml";

/// Error types for options file operations
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("Failed to read options file {}: {source}", path.display())]
    IoError { path: PathBuf, source: io::Error },

    #[error("Failed to parse options file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error(transparent)]
    Format(#[from] UnsupportedFormatError),
}

/// Options as written in a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsFile {
    #[serde(default)]
    pub debug: bool,

    pub source: Option<PathBuf>,

    pub env: Option<String>,

    pub target: Option<PathBuf>,

    /// "es6" or "commonjs"
    pub export_format: Option<String>,

    pub mask: Option<toml::Table>,

    pub extend: Option<toml::Table>,
}

impl OptionsFile {
    /// Load and parse options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        let contents = fs::read_to_string(path).map_err(|source| OptionsError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse options from a TOML string
    pub fn parse(s: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(s)?)
    }

    /// Convert into pipeline options. An unknown export format fails here,
    /// before anything runs.
    pub fn into_options(self) -> Result<Options, OptionsError> {
        let mut options = Options::new().with_debug(self.debug);

        if let Some(source) = self.source {
            options = options.with_source(source);
        }
        if let Some(env) = self.env {
            options = options.with_env(env);
        }
        if let Some(target) = self.target {
            options = options.with_target(target);
        }
        if let Some(format) = self.export_format {
            options = options.with_export_format(format.parse::<ExportFormat>()?);
        }
        if let Some(mask) = self.mask {
            options = options.with_mask(Value::Object(toml_table_to_map(mask)));
        }
        if let Some(extend) = self.extend {
            options = options.with_extend(Value::Object(toml_table_to_map(extend)));
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_file() {
        let file = OptionsFile::parse(
            r#"
            debug = true
            source = "./test/case_1"
            env = "production"
            target = "./out/config.js"
            export_format = "commonjs"

            [mask]
            val_1 = true
            [mask.obj_A]
            val_A2 = true

            [extend]
            val_3 = 789
            "#,
        )
        .unwrap();

        let options = file.into_options().unwrap();

        assert!(options.debug());
        assert_eq!(options.source(), Some(&PathBuf::from("./test/case_1")));
        assert_eq!(options.env(), Some("production"));
        assert_eq!(options.target(), &PathBuf::from("./out/config.js"));
        assert_eq!(options.export_format(), ExportFormat::CommonJs);
        assert_eq!(
            options.mask,
            Some(json!({"val_1": true, "obj_A": {"val_A2": true}}))
        );
        assert_eq!(options.extend, Some(json!({"val_3": 789})));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let options = OptionsFile::parse("").unwrap().into_options().unwrap();

        assert_eq!(options.target(), &PathBuf::from("./config.js"));
        assert_eq!(options.export_format(), ExportFormat::Es6);
        assert!(options.mask.is_none());
    }

    #[test]
    fn test_unknown_export_format() {
        let file = OptionsFile::parse(r#"export_format = "amd""#).unwrap();

        let err = file.into_options().unwrap_err();

        assert!(matches!(err, OptionsError::Format(UnsupportedFormatError(ref f)) if f == "amd"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = OptionsFile::parse(r#"exportFormat = "es6""#);
        assert!(matches!(result, Err(OptionsError::ParseError(_))));
    }

    #[test]
    fn test_from_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "source = \"./config\"").unwrap();

        let file = OptionsFile::from_file(temp.path()).unwrap();
        assert_eq!(file.source, Some(PathBuf::from("./config")));
    }

    #[test]
    fn test_missing_file() {
        let err = OptionsFile::from_file(Path::new("/nonexistent/masked-config.toml")).unwrap_err();
        assert!(matches!(err, OptionsError::IoError { .. }));
    }
}
