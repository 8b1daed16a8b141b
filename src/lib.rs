//! kvendor - cluster package vendoring
//!
//! kvendor turns one declarative, hierarchical configuration (default
//! packages plus per-cluster overrides) into two artifacts per cluster:
//!
//! - a deterministically ordered `kustomization.yaml` resource list, and
//! - a vendored copy of every referenced package's versioned source tree.
//!
//! # Architecture Overview
//!
//! Leaves first:
//!
//! - [`config`] - two-phase parse of `kvendor.yaml` into [`config::ConfigSpec`],
//!   plus tool [`config::Settings`]
//! - [`resolver`] - defaults merged with cluster overrides
//! - [`ordering`] / [`kustomization`] - deterministic resource lists that keep
//!   hand-authored entries
//! - [`git`] / [`source`] - shallow tag clones into an in-memory tree
//! - [`installer`] - materialization of a fetched tree onto disk
//! - [`sync`] - orchestration across every group and cluster
//! - [`render`] - the external build tool (`kustomize build`)
//!
//! # Configuration Format (kvendor.yaml)
//!
//! ```yaml
//! apiVersion: kvendor.io/v1alpha1
//! kind: ClusterConfig
//! name: my-fleet
//! spec:
//!   modules:
//!     "monitoring/prometheus": { version: "0.1.0", weight: 1 }
//!   addons:
//!     ingress: { version: "1.2.0" }
//!   groups:
//!     - name: dev
//!       clusters:
//!         - name: dev-1
//!           context: kind-dev-1
//!           modules:
//!             "monitoring/prometheus": { version: "0.2.0", weight: 1 }
//! ```
//!
//! # Generated Layout
//!
//! ```text
//! clusters/all-groups/bases/kustomization.yaml
//! clusters/<group>/<cluster>/bases/kustomization.yaml
//! clusters/<group>/<cluster>/kustomization.yaml
//! vendors/modules/<name>-<version>/<flavor>/...
//! vendors/add-ons/<name>-<version>/...
//! ```
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use kvendor_cli::config::{Settings, load_config};
//! use kvendor_cli::sync::{SyncOptions, sync};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = load_config(Path::new("kvendor.yaml"))?;
//! let options = SyncOptions::from_settings(&Settings::default());
//! let report = sync(&config, Path::new("."), &options).await?;
//! println!("{} clusters", report.clusters);
//! # Ok(())
//! # }
//! ```

// Core functionality modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod resolver;

// Resource lists
pub mod kustomization;
pub mod ordering;

// Git integration
pub mod git;
pub mod source;

// Output
pub mod installer;
pub mod render;
pub mod sync;

// Supporting modules
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
