//! Paths of the generated on-disk layout.
//!
//! ```text
//! <root>/clusters/all-groups/bases/kustomization.yaml     shared scope list
//! <root>/clusters/<group>/<cluster>/bases/kustomization.yaml
//! <root>/clusters/<group>/<cluster>/kustomization.yaml    overlay
//! <root>/vendors/modules/<name>-<version>/<flavor>/...
//! <root>/vendors/add-ons/<name>-<version>/...
//! ```

use std::path::{Path, PathBuf};

use crate::constants::{BASES_DIR, CLUSTERS_DIR, KUSTOMIZATION_FILE, SHARED_SCOPE_DIR, VENDORS_DIR};

/// Generated layout below one destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn shared_bases_dir(&self) -> PathBuf {
        self.root.join(CLUSTERS_DIR).join(SHARED_SCOPE_DIR).join(BASES_DIR)
    }

    #[must_use]
    pub fn cluster_dir(&self, group: &str, cluster: &str) -> PathBuf {
        self.root.join(CLUSTERS_DIR).join(group).join(cluster)
    }

    #[must_use]
    pub fn cluster_bases_dir(&self, group: &str, cluster: &str) -> PathBuf {
        self.cluster_dir(group, cluster).join(BASES_DIR)
    }

    #[must_use]
    pub fn overlay_file(&self, group: &str, cluster: &str) -> PathBuf {
        self.cluster_dir(group, cluster).join(KUSTOMIZATION_FILE)
    }

    #[must_use]
    pub fn vendor_root(&self) -> PathBuf {
        self.root.join(VENDORS_DIR)
    }

    /// Absolute path of a root-relative vendor directory.
    #[must_use]
    pub fn vendor_path(&self, vendor_dir: &str) -> PathBuf {
        vendor_dir.split('/').fold(self.root.clone(), |path, part| path.join(part))
    }
}

/// Prefix leading from a scope's bases directory back to the root.
#[must_use]
pub const fn shared_scope_prefix() -> &'static str {
    "../../../"
}

#[must_use]
pub const fn cluster_scope_prefix() -> &'static str {
    "../../../../"
}
