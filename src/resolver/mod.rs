//! Scope resolution: defaults merged with overrides.
//!
//! A cluster's effective package set is its enclosing scope's defaults with the
//! cluster's overrides applied on top. Overrides replace whole entries (there
//! is no field-level merge) and an override with `disabled: true` removes the
//! package from the result.
//!
//! A package that is disabled in the *defaults* and not overridden is passed
//! through unchanged; the ordering stage filters it. Removal only ever happens
//! through an explicit override.
//!
//! ```rust
//! use kvendor_cli::config::{Package, package_map};
//! use kvendor_cli::resolver::resolve;
//!
//! let defaults = package_map([Package::module("m1", "flavor1", "0.1.0", 1)]);
//! let overrides = package_map([Package::module("m1", "flavor1", "0.1.1", 1)]);
//!
//! let resolved = resolve(&defaults, &overrides);
//! assert_eq!(resolved.values().next().unwrap().version, "0.1.1");
//! ```

use crate::config::{ConfigSpec, Cluster, PackageMap};

/// Merges `overrides` into `defaults`.
///
/// - keys only in `defaults` pass through unchanged,
/// - keys in `overrides` replace the default entry, or add a new one,
/// - keys whose override is disabled are absent from the result.
#[must_use]
pub fn resolve(defaults: &PackageMap, overrides: &PackageMap) -> PackageMap {
    let mut resolved = defaults.clone();
    for (id, package) in overrides {
        if package.disabled {
            resolved.remove(id);
        } else {
            resolved.insert(id.clone(), package.clone());
        }
    }
    resolved
}

/// Effective package sets of one scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedScope {
    pub modules: PackageMap,
    pub addons: PackageMap,
}

impl ResolvedScope {
    /// The shared top-level scope: the defaults with an empty override map.
    #[must_use]
    pub fn shared(config: &ConfigSpec) -> Self {
        Self {
            modules: resolve(&config.modules, &PackageMap::new()),
            addons: resolve(&config.addons, &PackageMap::new()),
        }
    }

    /// A cluster scope: the defaults with the cluster's overrides applied.
    #[must_use]
    pub fn cluster(config: &ConfigSpec, cluster: &Cluster) -> Self {
        Self {
            modules: resolve(&config.modules, &cluster.modules),
            addons: resolve(&config.addons, &cluster.addons),
        }
    }

    /// Packages of this scope that would be rendered, modules first.
    pub fn enabled(&self) -> impl Iterator<Item = &crate::config::Package> {
        self.modules.values().chain(self.addons.values()).filter(|p| p.is_enabled())
    }
}
