//! Canonicalization of the raw schema into domain types.
//!
//! This is the second phase of parsing and a pure function: composite module
//! keys are split into `(name, flavor)`, identities are checked for
//! uniqueness per map, and the type marker is verified. It never touches the
//! filesystem, so it is tested directly on in-memory values.

use std::collections::{BTreeMap, HashSet};

use super::model::{Cluster, ConfigSpec, Group, Package, PackageId, PackageMap};
use super::schema::{RawAddon, RawCluster, RawConfig, RawModule};
use crate::constants::{CONFIG_API_VERSION, CONFIG_KIND, SHARED_SCOPE_DIR};
use crate::core::KvendorError;

fn invalid(reason: impl Into<String>) -> KvendorError {
    KvendorError::ConfigInvalid {
        reason: reason.into(),
    }
}

/// Splits a module key `"<name>/<flavor>"` at its last `/`.
///
/// Surrounding whitespace and slashes are ignored, so `" m1/flavor1 "`,
/// `"m1 / flavor1"` and `"m1/flavor1/"` denote the same module. The name may
/// contain further `/`.
pub fn parse_module_key(key: &str) -> Result<PackageId, KvendorError> {
    let trimmed = key.trim().trim_matches('/');
    let (name, flavor) = trimmed
        .rsplit_once('/')
        .ok_or_else(|| invalid(format!("module key '{key}' must have the form '<name>/<flavor>'")))?;

    let name = name.trim().trim_end_matches('/').trim_end();
    let flavor = flavor.trim();
    if name.is_empty() || flavor.is_empty() {
        return Err(invalid(format!("module key '{key}' has an empty name or flavor")));
    }
    Ok(PackageId::module(name, flavor))
}

/// Canonicalizes an addon key (its trimmed name).
pub fn parse_addon_key(key: &str) -> Result<PackageId, KvendorError> {
    let name = key.trim().trim_matches('/');
    if name.is_empty() {
        return Err(invalid(format!("addon key '{key}' is empty")));
    }
    Ok(PackageId::addon(name))
}

fn insert_unique(
    map: &mut PackageMap,
    package: Package,
    raw_key: &str,
    scope: &str,
) -> Result<(), KvendorError> {
    let id = package.id.clone();
    if map.insert(id.clone(), package).is_some() {
        return Err(invalid(format!(
            "{} '{}' is declared more than once in {} (key '{}')",
            id.kind, id, scope, raw_key
        )));
    }
    Ok(())
}

fn canonical_modules(
    raw: &BTreeMap<String, RawModule>,
    scope: &str,
) -> Result<PackageMap, KvendorError> {
    let mut map = PackageMap::new();
    for (key, module) in raw {
        let package = Package {
            id: parse_module_key(key)?,
            version: module.version.trim().to_string(),
            disabled: module.disabled,
            weight: module.weight,
        };
        insert_unique(&mut map, package, key, scope)?;
    }
    Ok(map)
}

fn canonical_addons(
    raw: &BTreeMap<String, RawAddon>,
    scope: &str,
) -> Result<PackageMap, KvendorError> {
    let mut map = PackageMap::new();
    for (key, addon) in raw {
        let package = Package {
            id: parse_addon_key(key)?,
            version: addon.version.trim().to_string(),
            disabled: addon.disabled,
            weight: 0,
        };
        insert_unique(&mut map, package, key, scope)?;
    }
    Ok(map)
}

/// Group and cluster names become single directory names below `clusters/`.
fn check_dir_name(what: &str, name: &str) -> Result<(), KvendorError> {
    if name.is_empty() {
        return Err(invalid(format!("a {what} without a name is declared")));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(invalid(format!(
            "{what} name '{name}' must be a single path segment without '/' or '\\'"
        )));
    }
    Ok(())
}

fn canonical_cluster(group: &str, raw: &RawCluster) -> Result<Cluster, KvendorError> {
    let name = raw.name.trim();
    check_dir_name(&format!("cluster in group '{group}'"), name)?;
    let scope = format!("cluster '{group}/{name}'");
    Ok(Cluster {
        name: name.to_string(),
        context: raw.context.trim().to_string(),
        modules: canonical_modules(&raw.modules, &scope)?,
        addons: canonical_addons(&raw.addons, &scope)?,
    })
}

/// Turns a decoded [`RawConfig`] into the canonical [`ConfigSpec`].
pub fn canonicalize(raw: &RawConfig) -> Result<ConfigSpec, KvendorError> {
    if raw.kind != CONFIG_KIND {
        return Err(invalid(format!("kind must be '{CONFIG_KIND}', found '{}'", raw.kind)));
    }
    if raw.api_version != CONFIG_API_VERSION {
        return Err(invalid(format!(
            "apiVersion must be '{CONFIG_API_VERSION}', found '{}'",
            raw.api_version
        )));
    }

    let mut group_names = HashSet::new();
    let mut groups = Vec::with_capacity(raw.spec.groups.len());
    for raw_group in &raw.spec.groups {
        let group_name = raw_group.name.trim();
        check_dir_name("group", group_name)?;
        if group_name == SHARED_SCOPE_DIR {
            return Err(invalid(format!(
                "group name '{SHARED_SCOPE_DIR}' is reserved for the shared scope"
            )));
        }
        if !group_names.insert(group_name) {
            return Err(invalid(format!("group '{group_name}' is declared more than once")));
        }

        let mut cluster_names = HashSet::new();
        let mut clusters = Vec::with_capacity(raw_group.clusters.len());
        for raw_cluster in &raw_group.clusters {
            let cluster = canonical_cluster(group_name, raw_cluster)?;
            if !cluster_names.insert(cluster.name.clone()) {
                return Err(invalid(format!(
                    "cluster '{}' is declared more than once in group '{group_name}'",
                    cluster.name
                )));
            }
            clusters.push(cluster);
        }

        groups.push(Group {
            name: group_name.to_string(),
            clusters,
        });
    }

    Ok(ConfigSpec {
        name: raw.name.clone(),
        modules: canonical_modules(&raw.spec.modules, "spec.modules")?,
        addons: canonical_addons(&raw.spec.addons, "spec.addons")?,
        groups,
    })
}
