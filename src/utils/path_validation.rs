//! Path validation for trees fetched from upstream.
//!
//! Relative paths coming out of a git tree are untrusted input: a crafted
//! entry must never make the materializer write outside its target directory.

use std::path::{Component, Path, PathBuf};

use crate::core::KvendorError;

/// Converts a `/`-separated tree path into a relative [`PathBuf`], rejecting
/// absolute paths, `..` components and empty paths.
pub fn safe_relative_path(path: &str) -> Result<PathBuf, KvendorError> {
    let unsafe_path = || KvendorError::UnsafePath {
        path: path.to_string(),
    };

    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path());
            }
        }
    }

    if out.as_os_str().is_empty() {
        return Err(unsafe_path());
    }
    Ok(out)
}
