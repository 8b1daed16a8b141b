//! The deduplicated fetch plan.
//!
//! Instances are collected from the shared scope and every cluster scope.
//! Instance identity is `(kind, name, flavor, version)`; the same package at
//! two versions is two instances. Instances are then grouped into vendoring
//! units, one per vendor directory: all flavors of one module version are
//! fetched once and written once, so concurrent units never share an output
//! path.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{ConfigSpec, Package, PackageId, PackageKind};
use crate::core::KvendorError;
use crate::ordering::vendor_dir;
use crate::resolver::ResolvedScope;

/// One fetch+materialize unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorUnit {
    /// Root-relative vendor directory, e.g. `vendors/modules/m1-0.1.0`.
    pub dir: String,
    pub kind: PackageKind,
    pub name: String,
    pub version: String,
    /// Instances served by this unit; several flavors for modules, one for addons.
    pub packages: Vec<Package>,
}

impl VendorUnit {
    /// The instance the fetch is made for.
    #[must_use]
    pub fn primary(&self) -> &Package {
        &self.packages[0]
    }

    /// Flavors requested from this unit (empty for addons).
    #[cfg(test)]
    fn flavors(&self) -> Vec<&str> {
        self.packages.iter().filter_map(|p| p.id.flavor.as_deref()).collect()
    }
}

type UnitKey = (PackageKind, String, String);

/// Builds the vendoring units for every enabled instance of every scope.
///
/// Units are returned in deterministic order. Two distinct packages whose
/// vendor directories collide (e.g. `a` at `1-b` and `a-1` at `b`) are a
/// configuration error.
pub fn fetch_plan(config: &ConfigSpec) -> Result<Vec<VendorUnit>, KvendorError> {
    let scopes = std::iter::once(ResolvedScope::shared(config))
        .chain(config.clusters().map(|(_, cluster)| ResolvedScope::cluster(config, cluster)));
    plan_scopes(scopes)
}

/// Builds the vendoring units for the enabled instances of `scopes`.
pub fn plan_scopes(
    scopes: impl IntoIterator<Item = ResolvedScope>,
) -> Result<Vec<VendorUnit>, KvendorError> {
    let mut grouped: BTreeMap<UnitKey, BTreeMap<PackageId, Package>> = BTreeMap::new();
    for scope in scopes {
        for package in scope.enabled() {
            let key = (package.id.kind, package.id.name.clone(), package.version.clone());
            grouped.entry(key).or_default().entry(package.id.clone()).or_insert_with(|| package.clone());
        }
    }

    let mut seen_dirs = BTreeSet::new();
    let mut units = Vec::with_capacity(grouped.len());
    for ((kind, name, version), packages) in grouped {
        let packages: Vec<Package> = packages.into_values().collect();
        let dir = vendor_dir(&packages[0]);
        if !seen_dirs.insert(dir.clone()) {
            return Err(KvendorError::ConfigInvalid {
                reason: format!("two packages would be vendored into the same directory '{dir}'"),
            });
        }
        units.push(VendorUnit {
            dir,
            kind,
            name,
            version,
            packages,
        });
    }
    Ok(units)
}
