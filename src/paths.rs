//! Path resolution against the invocation's working directory

use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` to an absolute, lexically normalized path.
///
/// Relative paths are taken relative to `working_dir`. Nothing is required
/// to exist on disk.
pub fn resolve(working_dir: &Path, path: &Path) -> io::Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty path"));
    }
    let absolute = std::path::absolute(working_dir.join(path))?;
    Ok(normalize(&absolute))
}

/// Remove `.` components and fold `..` into their parent.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
