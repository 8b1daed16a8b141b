//! Materialization of fetched package trees onto disk.
//!
//! [`write_tree`] recreates a [`PackageTree`] below a target directory: for
//! each file it creates the parent directories, then stream-copies the bytes
//! into a freshly created file. There is no rollback. The first failure
//! aborts and leaves whatever was already written, so callers that need a
//! clean result remove the target beforehand (the sync orchestrator removes
//! the whole vendor root).
//!
//! Paths coming out of a tree are validated before use: absolute paths and
//! `..` components are refused with [`KvendorError::UnsafePath`], so nothing is
//! written outside the target. Trees only ever contain regular files (the
//! fetcher drops symlinks), so no link is followed or created.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::core::{CancelToken, KvendorError};
use crate::source::{PackageTree, SourceTree};
use crate::utils::{ensure_parent_dir, safe_relative_path};

/// Summary of one materialized tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub files: usize,
    pub bytes: u64,
}

/// Writes every file of `package` below `target`.
///
/// Blocking; async callers run it on the blocking pool. `cancel` is checked
/// before each file.
pub fn write_tree(package: &PackageTree, target: &Path, cancel: &CancelToken) -> Result<WriteStats> {
    let mut stats = WriteStats::default();

    for file in package.files() {
        cancel.check()?;

        let relative = safe_relative_path(&file.relative_path)?;
        let destination = target.join(relative);
        ensure_parent_dir(&destination)?;

        let mut reader = package.tree().open(&file.source_path).ok_or_else(|| {
            KvendorError::FileSystemError {
                operation: "read fetched file".to_string(),
                path: file.source_path.clone(),
            }
        })?;

        let written = copy_into(&mut reader, &destination)
            .with_context(|| KvendorError::FileSystemError {
                operation: "write file".to_string(),
                path: destination.display().to_string(),
            })?;

        if file.executable {
            mark_executable(&destination)?;
        }

        stats.files += 1;
        stats.bytes += written;
    }

    tracing::trace!(
        "Wrote {} files ({} bytes) to {}",
        stats.files,
        stats.bytes,
        target.display()
    );
    Ok(stats)
}

fn copy_into(reader: &mut dyn io::Read, destination: &Path) -> io::Result<u64> {
    let mut writer = BufWriter::new(File::create(destination)?);
    let written = io::copy(reader, &mut writer)?;
    writer.flush()?;
    Ok(written)
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)
        .with_context(|| format!("Failed to read permissions of {}", path.display()))?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    std::fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
