//! Canonical domain types of the configuration.
//!
//! These are produced by [`super::canonical::canonicalize`] from the raw
//! schema and are immutable for the rest of an invocation. Package maps are
//! keyed by structured identity ([`PackageId`]) so overrides match defaults
//! regardless of how the key was spelled in the document.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{ADDONS_DIR, MODULES_DIR};
use crate::core::KvendorError;

/// Package kind. Modules carry a flavor and a weight, addons carry neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Module,
    Addon,
}

impl PackageKind {
    /// Kind as it appears in upstream tags (`module-...`, `addon-...`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Addon => "addon",
        }
    }

    /// Directory name used both upstream and under `vendors/`.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Module => MODULES_DIR,
            Self::Addon => ADDONS_DIR,
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured package identity: `(kind, canonical name, flavor)`.
///
/// `flavor` is `Some` exactly for modules. The derived ordering sorts by kind,
/// then name, then flavor, which is what ordering ties fall back to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PackageId {
    pub kind: PackageKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
}

impl PackageId {
    #[must_use]
    pub fn module(name: impl Into<String>, flavor: impl Into<String>) -> Self {
        Self {
            kind: PackageKind::Module,
            name: name.into(),
            flavor: Some(flavor.into()),
        }
    }

    #[must_use]
    pub fn addon(name: impl Into<String>) -> Self {
        Self {
            kind: PackageKind::Addon,
            name: name.into(),
            flavor: None,
        }
    }

    /// Name with `/` replaced by `-`, as used in tags.
    #[must_use]
    pub fn dashed_name(&self) -> String {
        self.name.replace('/', "-")
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.flavor {
            Some(flavor) => write!(f, "{}/{}", self.name, flavor),
            None => f.write_str(&self.name),
        }
    }
}

/// One package entry of a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub id: PackageId,
    pub version: String,
    pub disabled: bool,
    /// Build-order weight; always 0 for addons.
    pub weight: i64,
}

impl Package {
    #[must_use]
    pub fn module(
        name: impl Into<String>,
        flavor: impl Into<String>,
        version: impl Into<String>,
        weight: i64,
    ) -> Self {
        Self {
            id: PackageId::module(name, flavor),
            version: version.into(),
            disabled: false,
            weight,
        }
    }

    #[must_use]
    pub fn addon(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: PackageId::addon(name),
            version: version.into(),
            disabled: false,
            weight: 0,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !self.disabled
    }
}

/// Identity-keyed package map of one scope (modules or addons).
pub type PackageMap = BTreeMap<PackageId, Package>;

/// Builds a [`PackageMap`] from packages, keyed by their identity.
#[must_use]
pub fn package_map(packages: impl IntoIterator<Item = Package>) -> PackageMap {
    packages.into_iter().map(|p| (p.id.clone(), p)).collect()
}

/// A target cluster and its optional overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub name: String,
    /// Remote-context identifier used by deployment tooling.
    pub context: String,
    pub modules: PackageMap,
    pub addons: PackageMap,
}

/// A named, ordered collection of clusters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub clusters: Vec<Cluster>,
}

/// The whole canonical configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSpec {
    /// Display name of the configuration.
    pub name: String,
    pub modules: PackageMap,
    pub addons: PackageMap,
    pub groups: Vec<Group>,
}

impl ConfigSpec {
    /// Looks up a declared group.
    pub fn group(&self, group: &str) -> Result<&Group, KvendorError> {
        self.groups.iter().find(|g| g.name == group).ok_or_else(|| KvendorError::GroupNotFound {
            group: group.to_string(),
        })
    }

    /// Looks up a declared cluster inside a declared group.
    pub fn cluster(&self, group: &str, cluster: &str) -> Result<&Cluster, KvendorError> {
        self.group(group)?.clusters.iter().find(|c| c.name == cluster).ok_or_else(|| {
            KvendorError::ClusterNotFound {
                group: group.to_string(),
                cluster: cluster.to_string(),
            }
        })
    }

    /// Iterates `(group, cluster)` pairs in declaration order.
    pub fn clusters(&self) -> impl Iterator<Item = (&Group, &Cluster)> {
        self.groups.iter().flat_map(|g| g.clusters.iter().map(move |c| (g, c)))
    }
}
