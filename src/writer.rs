//! Rendering and writing the generated config module

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigMap;

/// Lint suppression emitted at the top of every generated file
pub const HEADER: &str = "/*eslint quote-props:0, quotes:0 */\n\n";

/// Module syntax of the generated file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `export default {...};`
    #[default]
    Es6,
    /// `module.exports = {...};`
    CommonJs,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Es6 => "es6",
            ExportFormat::CommonJs => "commonjs",
        }
    }

    fn statement_prefix(&self) -> &'static str {
        match self {
            ExportFormat::Es6 => "export default ",
            ExportFormat::CommonJs => "module.exports = ",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An export format name other than `es6` or `commonjs`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported export format '{0}': expected 'es6' or 'commonjs'")]
pub struct UnsupportedFormatError(pub String);

impl FromStr for ExportFormat {
    type Err = UnsupportedFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "es6" => Ok(ExportFormat::Es6),
            "commonjs" => Ok(ExportFormat::CommonJs),
            other => Err(UnsupportedFormatError(other.to_string())),
        }
    }
}

/// Writer errors
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to create the target directory '{}': {source}", path.display())]
    DirectoryCreation { path: PathBuf, source: io::Error },

    #[error("failed to write the config file '{}': {source}", path.display())]
    FileWrite { path: PathBuf, source: io::Error },
}

/// Render `data` as a module in `format`.
///
/// Keys keep the mapping's order; the literal is 2-space indented JSON.
pub fn render(data: &ConfigMap, format: ExportFormat) -> Result<String, serde_json::Error> {
    let literal = serde_json::to_string_pretty(data)?;
    Ok(format!(
        "{}{}{};\n",
        HEADER,
        format.statement_prefix(),
        literal
    ))
}

/// Render `data` and write it to `target`, creating parent directories.
///
/// `target` must already be resolved. The file is written with one call.
pub fn write_config(data: &ConfigMap, target: &Path, format: ExportFormat) -> Result<(), WriteError> {
    let contents = render(data, format).map_err(|e| WriteError::FileWrite {
        path: target.to_path_buf(),
        source: io::Error::new(
            io::ErrorKind::InvalidData,
            format!("JSON serialization failed: {}", e),
        ),
    })?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|source| WriteError::DirectoryCreation {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(target, contents).map_err(|source| WriteError::FileWrite {
        path: target.to_path_buf(),
        source,
    })
}
