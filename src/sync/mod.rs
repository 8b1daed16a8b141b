//! Synchronization of a configuration onto disk.
//!
//! [`sync`] is the only operation with side effects on the destination tree.
//! It runs these steps in order and stops at the first failure:
//!
//! 1. create the `clusters/` skeleton for every declared group and cluster
//! 2. rewrite the shared scope's resource list (`clusters/all-groups/bases`)
//! 3. for each cluster, resolve its packages, rewrite its resource list and
//!    make sure its overlay references `bases`
//! 4. with downloads enabled: remove `vendors/`, then fetch and materialize
//!    every unit of the [`plan::fetch_plan`] concurrently, fail-fast
//!
//! Without downloads, step 4 is skipped and `vendors/` is left as it is.
//!
//! # Cancellation
//!
//! The [`CancelToken`] in [`SyncOptions`] is checked between steps, raced by
//! every git command and polled by file writers between files. On
//! cancellation the skeleton and any resource lists already written stay
//! written, `vendors/` may be partially populated, and the error chain
//! contains [`crate::core::KvendorError::Cancelled`].

pub mod layout;
pub mod plan;

use anyhow::{Context, Result};
use futures::{StreamExt, TryStreamExt, stream};
use std::path::Path;
use std::time::Duration;

use crate::config::{ConfigSpec, Settings};
use crate::constants::KUSTOMIZATION_FILE;
use crate::core::CancelToken;
use crate::git::ensure_git_available;
use crate::installer::{WriteStats, write_tree};
use crate::kustomization::{Kustomization, ensure_overlay};
use crate::ordering::compute_resource_list_with_prefix;
use crate::resolver::ResolvedScope;
use crate::source::VersionedSourceFetcher;
use crate::utils::{ensure_dir, progress::vendoring_bar, remove_dir_all};

pub use layout::{Layout, cluster_scope_prefix, shared_scope_prefix};
pub use plan::{VendorUnit, fetch_plan, plan_scopes};

/// Knobs of one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Fetch and materialize packages (step 4).
    pub download: bool,
    /// Upper bound of concurrently processed vendoring units.
    pub max_parallel: usize,
    pub upstream_url: String,
    pub clone_timeout: Duration,
    /// Show a progress bar while vendoring.
    pub progress: bool,
    pub cancel: CancelToken,
}

impl SyncOptions {
    /// Options derived from tool settings, downloads enabled, no progress bar.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            download: true,
            max_parallel: settings.effective_max_parallel(),
            upstream_url: settings.upstream_url.clone(),
            clone_timeout: settings.git_timeout(),
            progress: false,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub const fn with_download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }
}

/// One vendor directory written by a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendoredUnit {
    pub dir: String,
    pub files: usize,
    pub bytes: u64,
}

/// What a sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub clusters: usize,
    /// Generated files whose content changed (resource lists and overlays).
    pub files_written: usize,
    /// `None` when downloads were disabled.
    pub vendored: Option<Vec<VendoredUnit>>,
}

/// Rewrites the resource list in `bases_dir` for `scope`, keeping
/// hand-authored entries. Returns whether the file changed.
pub fn rewrite_resource_list(bases_dir: &Path, scope: &ResolvedScope, prefix: &str) -> Result<bool> {
    let path = bases_dir.join(KUSTOMIZATION_FILE);
    let mut kustomization = Kustomization::load_or_new(&path)?;
    let resources = compute_resource_list_with_prefix(
        &scope.modules,
        &scope.addons,
        &kustomization.resources(),
        prefix,
    );
    kustomization.set_resources(resources);
    kustomization.save(&path)
}

/// Creates the directory skeleton for every declared group and cluster.
pub fn ensure_skeleton(config: &ConfigSpec, layout: &Layout) -> Result<()> {
    ensure_dir(&layout.shared_bases_dir())?;
    for (group, cluster) in config.clusters() {
        ensure_dir(&layout.cluster_bases_dir(&group.name, &cluster.name))?;
    }
    Ok(())
}

/// Synchronizes `config` onto `root`.
pub async fn sync(config: &ConfigSpec, root: &Path, options: &SyncOptions) -> Result<SyncReport> {
    let layout = Layout::new(root);
    let cancel = &options.cancel;
    let mut report = SyncReport::default();

    cancel.check()?;
    ensure_skeleton(config, &layout).context("Failed to create the cluster directory skeleton")?;

    cancel.check()?;
    let shared = ResolvedScope::shared(config);
    if rewrite_resource_list(&layout.shared_bases_dir(), &shared, shared_scope_prefix())
        .context("Failed to rewrite the shared resource list")?
    {
        report.files_written += 1;
    }

    for (group, cluster) in config.clusters() {
        cancel.check()?;
        let scope = ResolvedScope::cluster(config, cluster);
        let bases = layout.cluster_bases_dir(&group.name, &cluster.name);

        let written = rewrite_resource_list(&bases, &scope, cluster_scope_prefix())
            .with_context(|| {
                format!("Failed to rewrite resource list of cluster '{}/{}'", group.name, cluster.name)
            })?;
        let overlay = ensure_overlay(&layout.overlay_file(&group.name, &cluster.name))
            .with_context(|| {
                format!("Failed to update overlay of cluster '{}/{}'", group.name, cluster.name)
            })?;

        tracing::debug!(
            target: "sync",
            "Cluster {}/{}: {} modules, {} addons",
            group.name,
            cluster.name,
            scope.modules.len(),
            scope.addons.len()
        );
        report.files_written += usize::from(written) + usize::from(overlay);
        report.clusters += 1;
    }

    if options.download {
        cancel.check()?;
        report.vendored = Some(vendor_all(config, &layout, options).await?);
    } else {
        tracing::info!(target: "sync", "Downloads disabled, leaving {} untouched", layout.vendor_root().display());
    }

    Ok(report)
}

async fn vendor_all(
    config: &ConfigSpec,
    layout: &Layout,
    options: &SyncOptions,
) -> Result<Vec<VendoredUnit>> {
    let units = fetch_plan(config)?;
    if !units.is_empty() {
        ensure_git_available().await?;
    }

    remove_dir_all(&layout.vendor_root())?;
    tracing::info!(target: "sync", "Vendoring {} package directories", units.len());

    // Units share a private token so a failing unit stops the writers of the
    // others; the caller's token feeds into it.
    let abort = CancelToken::new();
    let forward = tokio::spawn({
        let outer = options.cancel.clone();
        let abort = abort.clone();
        async move {
            outer.cancelled().await;
            abort.cancel();
        }
    });

    let fetcher = VersionedSourceFetcher::new(&options.upstream_url, options.clone_timeout);
    let bar = vendoring_bar(units.len() as u64, options.progress);
    let concurrency = options.max_parallel.max(1);

    let result: Result<Vec<VendoredUnit>> = stream::iter(units)
        .map(|unit| {
            let fetcher = &fetcher;
            let abort = abort.clone();
            let bar = bar.clone();
            async move {
                let primary = unit.primary().clone();
                let vendored = vendor_unit(fetcher, &unit, layout, &abort).await.with_context(|| {
                    format!(
                        "Failed to vendor {} '{}' at version {}",
                        primary.id.kind, primary.id.name, primary.version
                    )
                });
                if vendored.is_err() {
                    abort.cancel();
                } else {
                    bar.set_message(unit.dir.clone());
                    bar.inc(1);
                }
                vendored
            }
        })
        .buffer_unordered(concurrency)
        .try_collect()
        .await;

    forward.abort();
    bar.finish_and_clear();

    let mut vendored = result?;
    vendored.sort_by(|a, b| a.dir.cmp(&b.dir));
    Ok(vendored)
}

async fn vendor_unit(
    fetcher: &VersionedSourceFetcher,
    unit: &VendorUnit,
    layout: &Layout,
    cancel: &CancelToken,
) -> Result<VendoredUnit> {
    let tree = fetcher.fetch_package_tree(unit.primary(), cancel).await?;
    for package in &unit.packages[1..] {
        tree.ensure_flavor(package)?;
    }

    let target = layout.vendor_path(&unit.dir);
    let writer_cancel = cancel.clone();
    let WriteStats { files, bytes } =
        tokio::task::spawn_blocking(move || write_tree(&tree, &target, &writer_cancel))
            .await
            .map_err(|e| anyhow::anyhow!("Materializer task failed: {e}"))??;

    tracing::debug!(target: "sync", "Vendored {} ({} files, {} bytes)", unit.dir, files, bytes);
    Ok(VendoredUnit {
        dir: unit.dir.clone(),
        files,
        bytes,
    })
}
