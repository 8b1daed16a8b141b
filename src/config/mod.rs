//! Configuration model for kvendor
//!
//! Two kinds of configuration exist:
//!
//! 1. **The configuration document** (`kvendor.yaml`) - the declarative,
//!    hierarchical description of default packages, groups and clusters with
//!    their overrides. Parsed once per invocation and immutable afterwards.
//! 2. **Tool settings** ([`settings`]) - upstream URL, parallelism and the
//!    build command, layered from file, environment and flags.
//!
//! # Two-phase parse
//!
//! The document is first decoded into the raw [`schema`] (plain serde, keys
//! kept as written), then [`canonical::canonicalize`] produces the domain
//! types of [`model`]. Keeping the second phase a pure function means the key
//! splitting and uniqueness rules are tested without any I/O.
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
//!           addons:
//!             ingress: { disabled: true }
//! ```

pub mod canonical;
pub mod model;
pub mod schema;
pub mod settings;

pub use canonical::{canonicalize, parse_addon_key, parse_module_key};
pub use model::{
    Cluster, ConfigSpec, Group, Package, PackageId, PackageKind, PackageMap, package_map,
};
pub use schema::RawConfig;
pub use settings::Settings;

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::KvendorError;

/// Decodes and canonicalizes a configuration document held in memory.
///
/// `origin` only labels error messages.
pub fn parse_config(content: &str, origin: &str) -> Result<ConfigSpec> {
    let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| KvendorError::ConfigParse {
        file: origin.to_string(),
        reason: e.to_string(),
    })?;
    let spec = canonicalize(&raw)?;
    tracing::debug!(
        "Loaded configuration '{}': {} modules, {} addons, {} groups",
        spec.name,
        spec.modules.len(),
        spec.addons.len(),
        spec.groups.len()
    );
    Ok(spec)
}

/// Reads, decodes and canonicalizes the configuration document at `path`.
pub fn load_config(path: &Path) -> Result<ConfigSpec> {
    let content = std::fs::read_to_string(path).map_err(|e| KvendorError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_config(&content, &path.display().to_string())
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}
