//! Git operations wrapper for kvendor
//!
//! kvendor talks to the upstream catalogue through the system `git` binary,
//! so SSH agents, credential helpers and `file://` mirrors all work the way
//! they do for the user's own git. Every invocation goes through
//! [`command_builder::GitCommand`].
//!
//! # Fetch model
//!
//! A package fetch never touches the destination tree. [`ShallowClone`] makes a
//! bare, depth-1, single-ref clone into a private temporary directory, which is
//! deleted when the handle is dropped. The package subtree is then listed with
//! `git ls-tree -r -z` and read back with one `git cat-file --batch` call, so no
//! working tree is ever checked out.
//!
//! ```rust,no_run
//! use kvendor_cli::core::CancelToken;
//! use kvendor_cli::git::ShallowClone;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cancel = CancelToken::new();
//! let clone = ShallowClone::fetch(
//!     "https://github.com/kvendor/catalog.git",
//!     "addon-ingress-1.2.0",
//!     Duration::from_secs(120),
//!     &cancel,
//! )
//! .await?;
//! let entries = clone.list_tree("add-ons/ingress").await?;
//! println!("{} entries", entries.len());
//! # Ok(())
//! # }
//! ```

pub mod command_builder;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use crate::core::{CancelToken, KvendorError};
use command_builder::GitCommand;

pub use command_builder::strip_auth_from_url;

/// Object type of a tree entry as reported by `git ls-tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    /// A submodule (gitlink).
    Commit,
}

/// One entry of `git ls-tree -r -z` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Octal file mode, e.g. `100644`.
    pub mode: String,
    pub kind: ObjectKind,
    pub oid: String,
    /// Repository-relative path with `/` separators.
    pub path: String,
}

impl TreeEntry {
    /// Regular file (plain or executable); symlinks and gitlinks are not.
    #[must_use]
    pub fn is_regular_file(&self) -> bool {
        self.kind == ObjectKind::Blob && matches!(self.mode.as_str(), "100644" | "100755")
    }

    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.mode == "100755"
    }
}

/// A bare shallow clone living in a private temporary directory.
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct ShallowClone {
    _dir: TempDir,
    path: PathBuf,
    cancel: CancelToken,
    context: String,
}

impl ShallowClone {
    /// Clones exactly `reference` of `url` with depth 1.
    ///
    /// A missing ref surfaces as [`KvendorError::TagNotFound`], any other
    /// clone failure as [`KvendorError::GitCloneFailed`].
    pub async fn fetch(
        url: &str,
        reference: &str,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Self> {
        cancel.check()?;
        let dir = tempfile::Builder::new()
            .prefix("kvendor-")
            .tempdir()
            .context("Failed to create temporary clone directory")?;
        let path = dir.path().join("repo.git");

        tracing::debug!(target: "git", "Cloning {} at {}", strip_auth_from_url(url), reference);
        GitCommand::shallow_clone(url, reference, &path)
            .with_timeout(Some(timeout))
            .with_cancel(cancel)
            .with_context(reference)
            .execute_success()
            .await?;

        Ok(Self {
            _dir: dir,
            path,
            cancel: cancel.clone(),
            context: reference.to_string(),
        })
    }

    /// Path of the bare repository.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists every entry below `path` (recursively) at the cloned ref.
    pub async fn list_tree(&self, path: &str) -> Result<Vec<TreeEntry>> {
        let output = GitCommand::ls_tree("HEAD", path)
            .current_dir(&self.path)
            .with_cancel(&self.cancel)
            .with_context(self.context.as_str())
            .execute()
            .await?;
        parse_ls_tree(&output.stdout)
    }

    /// Reads the contents of `oids`, in order, with a single `cat-file --batch`.
    pub async fn read_blobs(&self, oids: &[&str]) -> Result<Vec<Vec<u8>>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }
        let mut input = String::with_capacity(oids.len() * 41);
        for oid in oids {
            input.push_str(oid);
            input.push('\n');
        }

        let output = GitCommand::cat_file_batch()
            .current_dir(&self.path)
            .stdin(input.into_bytes())
            .with_cancel(&self.cancel)
            .with_context(self.context.as_str())
            .execute()
            .await?;
        parse_cat_file_batch(&output.stdout, oids.len())
    }
}

/// Fails with [`KvendorError::GitNotFound`] when no usable git is installed.
pub async fn ensure_git_available() -> Result<()> {
    let version = GitCommand::version().execute_stdout().await?;
    tracing::debug!(target: "git", "Using {}", version);
    Ok(())
}

fn malformed(operation: &str, what: impl Into<String>) -> KvendorError {
    KvendorError::GitCommandError {
        operation: operation.to_string(),
        stderr: what.into(),
    }
}

/// Parses `git ls-tree -z` output: `<mode> SP <type> SP <oid> TAB <path> NUL`.
pub fn parse_ls_tree(output: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    for record in output.split(|b| *b == 0).filter(|r| !r.is_empty()) {
        let record = std::str::from_utf8(record)
            .map_err(|_| malformed("ls-tree", "entry is not valid UTF-8"))?;
        let (meta, path) = record
            .split_once('\t')
            .ok_or_else(|| malformed("ls-tree", format!("unexpected entry '{record}'")))?;

        let mut fields = meta.split(' ');
        let (Some(mode), Some(kind), Some(oid), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed("ls-tree", format!("unexpected entry '{record}'")).into());
        };
        let kind = match kind {
            "blob" => ObjectKind::Blob,
            "tree" => ObjectKind::Tree,
            "commit" => ObjectKind::Commit,
            other => {
                return Err(malformed("ls-tree", format!("unknown object type '{other}'")).into());
            }
        };

        entries.push(TreeEntry {
            mode: mode.to_string(),
            kind,
            oid: oid.to_string(),
            path: path.to_string(),
        });
    }
    Ok(entries)
}

/// Parses `git cat-file --batch` output: for each object
/// `<oid> SP <type> SP <size> LF <contents> LF`.
pub fn parse_cat_file_batch(output: &[u8], expected: usize) -> Result<Vec<Vec<u8>>> {
    let mut blobs = Vec::with_capacity(expected);
    let mut rest = output;

    while !rest.is_empty() {
        let header_end = rest
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| malformed("cat-file", "truncated object header"))?;
        let header = String::from_utf8_lossy(&rest[..header_end]).to_string();
        let fields: Vec<&str> = header.split(' ').collect();
        if fields.len() == 2 && fields[1] == "missing" {
            return Err(malformed("cat-file", format!("object {} is missing", fields[0])).into());
        }
        let size: usize = match fields.as_slice() {
            [_, _, size] => size
                .parse()
                .map_err(|_| malformed("cat-file", format!("bad object header '{header}'")))?,
            _ => return Err(malformed("cat-file", format!("bad object header '{header}'")).into()),
        };

        let body_start = header_end + 1;
        let body_end = body_start + size;
        if rest.len() < body_end + 1 || rest[body_end] != b'\n' {
            return Err(malformed("cat-file", format!("truncated object {}", fields[0])).into());
        }
        blobs.push(rest[body_start..body_end].to_vec());
        rest = &rest[body_end + 1..];
    }

    if blobs.len() != expected {
        return Err(malformed(
            "cat-file",
            format!("expected {expected} objects, got {}", blobs.len()),
        )
        .into());
    }
    Ok(blobs)
}
