//! File system helpers with path-carrying error context.
//!
//! Every failure names the offending path through a
//! [`KvendorError::FileSystemError`] so a failed sync points at the exact
//! directory or file that could not be created.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::core::KvendorError;

fn fs_error(operation: &str, path: &Path) -> KvendorError {
    KvendorError::FileSystemError {
        operation: operation.to_string(),
        path: path.display().to_string(),
    }
}

/// Ensures a directory exists, creating it and all parents if necessary.
///
/// "Already exists" is success, so concurrent callers creating overlapping
/// skeletons never fail each other. A non-directory at `path` is an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => {}
        Err(e) => return Err(e).context(fs_error("create directory", path)),
    }
    if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()))
            .context(fs_error("create directory", path));
    }
    Ok(())
}

/// Ensures the parent directory of a file path exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Removes a directory tree; a missing directory is not an error.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context(fs_error("remove directory", path)),
    }
}

/// Writes `content` to `path` via a temporary sibling file and a rename.
///
/// Readers never observe a half-written generated file.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;

    let temp_path = path.with_extension("tmp");
    {
        let mut file =
            fs::File::create(&temp_path).context(fs_error("create temp file", &temp_path))?;
        file.write_all(content).context(fs_error("write temp file", &temp_path))?;
        file.sync_all().context(fs_error("sync temp file", &temp_path))?;
    }

    fs::rename(&temp_path, path).context(fs_error("rename temp file", path))?;
    Ok(())
}

/// Reads a UTF-8 file, returning `None` when it does not exist.
pub fn read_optional_text(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context(fs_error("read file", path)),
    }
}
