//! Versioned package sources.
//!
//! Every package instance is published upstream under a tag built from its
//! kind, dash-joined name and version:
//!
//! | Package | Tag | Subtree |
//! |---|---|---|
//! | module `cat/name` 1.0.0 | `module-cat-name-1.0.0` | `modules/cat/name` |
//! | addon `ingress` 1.2.0 | `addon-ingress-1.2.0` | `add-ons/ingress` |
//!
//! [`VersionedSourceFetcher::fetch_package_tree`] clones exactly that tag into
//! a throwaway bare repository, copies the package subtree into a
//! [`MemoryTree`] and deletes the clone before returning. Fetches never share
//! state, since two packages may pin different tags of the same repository.
//! The result is all-or-nothing: any failure returns an error and no tree.

pub mod tree;

use anyhow::Result;
use std::time::Duration;

use crate::config::{Package, PackageId, PackageKind};
use crate::core::{CancelToken, KvendorError};
use crate::git::{ShallowClone, strip_auth_from_url};
pub use tree::{MemoryTree, SourceTree, WalkEntry, walk_filtered};

/// Upstream tag of a package instance, e.g. `module-cat-name-1.0.0`.
#[must_use]
pub fn tag_ref(package: &Package) -> String {
    format!(
        "{}-{}-{}",
        package.id.kind.as_str(),
        package.id.dashed_name(),
        package.version
    )
}

/// Repository path of a package's subtree, e.g. `modules/cat/name`.
#[must_use]
pub fn package_root(id: &PackageId) -> String {
    format!("{}/{}", id.kind.dir_name(), id.name)
}

fn not_found(package: &Package, name: String) -> KvendorError {
    KvendorError::PackageNotFound {
        kind: package.id.kind.to_string(),
        name,
        version: package.version.clone(),
    }
}

/// One regular file of a fetched package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Path relative to the package root.
    pub relative_path: String,
    /// Path inside the backing tree.
    pub source_path: String,
    pub executable: bool,
}

/// The filtered subtree of one package at one version.
#[derive(Debug, Clone)]
pub struct PackageTree {
    root: String,
    tree: MemoryTree,
}

impl PackageTree {
    /// Wraps `tree`, whose package files live under `root`.
    #[must_use]
    pub fn new(root: impl Into<String>, tree: MemoryTree) -> Self {
        Self {
            root: root.into(),
            tree,
        }
    }

    #[must_use]
    pub fn tree(&self) -> &MemoryTree {
        &self.tree
    }

    /// Regular files below the package root, relative to it.
    #[must_use]
    pub fn files(&self) -> Vec<FileRef> {
        walk_filtered(&self.tree, &self.root, |entry| !entry.is_dir)
            .into_iter()
            .map(|entry| {
                let source_path = format!("{}/{}", self.root, entry.relative_path);
                FileRef {
                    executable: self.tree.is_executable(&source_path),
                    relative_path: entry.relative_path,
                    source_path,
                }
            })
            .collect()
    }

    /// Verifies that a module's flavor directory exists in this tree.
    ///
    /// Addons have no flavor and always pass.
    pub fn ensure_flavor(&self, package: &Package) -> Result<(), KvendorError> {
        match &package.id.flavor {
            Some(flavor) if package.id.kind == PackageKind::Module => {
                if self.tree.list_files(&format!("{}/{flavor}", self.root)).is_empty() {
                    Err(not_found(package, package.id.to_string()))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

/// Fetches package trees from the upstream catalogue.
#[derive(Debug, Clone)]
pub struct VersionedSourceFetcher {
    upstream_url: String,
    clone_timeout: Duration,
}

impl VersionedSourceFetcher {
    #[must_use]
    pub fn new(upstream_url: impl Into<String>, clone_timeout: Duration) -> Self {
        Self {
            upstream_url: upstream_url.into(),
            clone_timeout,
        }
    }

    #[must_use]
    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    /// Fetches the subtree of `package` at its pinned version.
    ///
    /// # Errors
    ///
    /// - [`KvendorError::TagNotFound`] / [`KvendorError::GitCloneFailed`] when
    ///   the tag cannot be cloned
    /// - [`KvendorError::PackageNotFound`] when the clone succeeds but the
    ///   package subtree (or a module's flavor) is absent
    /// - [`KvendorError::Cancelled`] when `cancel` fires mid-fetch
    pub async fn fetch_package_tree(
        &self,
        package: &Package,
        cancel: &CancelToken,
    ) -> Result<PackageTree> {
        let tag = tag_ref(package);
        let root = package_root(&package.id);
        let start = std::time::Instant::now();

        let clone = ShallowClone::fetch(&self.upstream_url, &tag, self.clone_timeout, cancel).await?;

        let entries = clone.list_tree(&root).await?;
        let prefix = format!("{root}/");
        let mut files = Vec::new();
        for entry in entries {
            if !entry.path.starts_with(&prefix) {
                continue;
            }
            if entry.is_regular_file() {
                files.push(entry);
            } else {
                tracing::debug!(
                    target: "source",
                    "Skipping {} (mode {}) in {}",
                    entry.path,
                    entry.mode,
                    tag
                );
            }
        }

        if files.is_empty() {
            return Err(not_found(package, package.id.name.clone()).into());
        }

        let oids: Vec<&str> = files.iter().map(|f| f.oid.as_str()).collect();
        let blobs = clone.read_blobs(&oids).await?;
        drop(clone);

        let mut tree = MemoryTree::new();
        for (entry, contents) in files.iter().zip(blobs) {
            tree.insert(&entry.path, contents, entry.is_executable());
        }

        let fetched = PackageTree::new(root, tree);
        fetched.ensure_flavor(package)?;

        tracing::debug!(
            target: "source",
            "Fetched {} from {}: {} files, {} bytes in {}ms",
            tag,
            strip_auth_from_url(&self.upstream_url),
            fetched.tree().len(),
            fetched.tree().total_bytes(),
            start.elapsed().as_millis()
        );
        Ok(fetched)
    }
}
