//! Global constants used throughout the kvendor codebase.
//!
//! Directory names of the generated layout, file names, timeouts and
//! parallelism defaults live here so the on-disk contract is spelled out once.

use std::time::Duration;

/// Upstream package catalogue used when no override is configured.
pub const DEFAULT_UPSTREAM_URL: &str = "https://github.com/kvendor/catalog.git";

/// Default configuration document name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "kvendor.yaml";

/// Type marker: expected `kind` of the configuration document.
pub const CONFIG_KIND: &str = "ClusterConfig";

/// Type marker: expected `apiVersion` of the configuration document.
pub const CONFIG_API_VERSION: &str = "kvendor.io/v1alpha1";

/// Top-level directory holding every group and the shared scope.
pub const CLUSTERS_DIR: &str = "clusters";

/// Directory name of the shared top-level scope under [`CLUSTERS_DIR`].
pub const SHARED_SCOPE_DIR: &str = "all-groups";

/// Directory holding a scope's generated resource list.
pub const BASES_DIR: &str = "bases";

/// File name of both the generated resource list and the cluster overlay.
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

/// Root of every vendored package tree.
pub const VENDORS_DIR: &str = "vendors";

/// Vendor subdirectory for modules, also the upstream subdirectory name.
pub const MODULES_DIR: &str = "modules";

/// Vendor subdirectory for addons, also the upstream subdirectory name.
pub const ADDONS_DIR: &str = "add-ons";

/// Timeout for the shallow clone of one package tag.
pub const GIT_CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for local git plumbing commands (ls-tree, cat-file).
pub const GIT_LOCAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Minimum number of parallel vendoring units regardless of CPU count.
pub const MIN_PARALLELISM: usize = 10;

/// Multiplier applied to CPU core count for default parallelism.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 2;

/// Default CPU core count when detection fails.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Default concurrency for fetch+materialize units.
#[must_use]
pub fn default_max_parallel() -> usize {
    let cores = std::thread::available_parallelism().map_or(FALLBACK_CORE_COUNT, usize::from);
    (cores * PARALLELISM_CORE_MULTIPLIER).max(MIN_PARALLELISM)
}
