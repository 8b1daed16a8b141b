//! Deterministic resource ordering for generated resource lists.
//!
//! The generated list of a scope is rebuilt from scratch on every run:
//!
//! 1. disabled modules and addons are dropped,
//! 2. modules are ordered by ascending weight, ties by name (then flavor),
//! 3. addons follow in lexicographic name order,
//! 4. hand-authored entries of the previous list (anything that does not point
//!    into `vendors/modules/` or `vendors/add-ons/`) are appended in their
//!    original relative order.
//!
//! Stale vendor entries from an older run are therefore superseded, never
//! accumulated, while entries a user added by hand survive every rewrite.

use std::cmp::Ordering;

use crate::config::{Package, PackageKind, PackageMap};
use crate::constants::{ADDONS_DIR, MODULES_DIR, VENDORS_DIR};

/// Root-relative directory a package instance is vendored into:
/// `vendors/modules/<name>-<version>` or `vendors/add-ons/<name>-<version>`.
#[must_use]
pub fn vendor_dir(package: &Package) -> String {
    format!(
        "{VENDORS_DIR}/{}/{}-{}",
        package.id.kind.dir_name(),
        package.id.name,
        package.version
    )
}

/// Root-relative resource path of a package instance. Modules point at their
/// flavor directory inside the vendored module tree.
#[must_use]
pub fn resource_path(package: &Package) -> String {
    match (&package.id.kind, &package.id.flavor) {
        (PackageKind::Module, Some(flavor)) => format!("{}/{flavor}", vendor_dir(package)),
        _ => vendor_dir(package),
    }
}

/// Returns true when a resource entry follows the vendored-package convention,
/// i.e. it was generated by a previous run rather than written by hand.
///
/// Leading `.`/`..` segments are ignored so both root-relative and
/// file-relative spellings are recognised.
#[must_use]
pub fn is_generated_entry(entry: &str) -> bool {
    let mut segments = entry
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .skip_while(|s| *s == "." || *s == "..");

    segments.next() == Some(VENDORS_DIR)
        && matches!(segments.next(), Some(MODULES_DIR | ADDONS_DIR))
}

fn module_order(a: &Package, b: &Package) -> Ordering {
    a.weight
        .cmp(&b.weight)
        .then_with(|| a.id.name.cmp(&b.id.name))
        .then_with(|| a.id.flavor.cmp(&b.id.flavor))
}

/// Enabled packages in generation order: modules by weight then name, then
/// addons by name.
#[must_use]
pub fn ordered_packages<'a>(modules: &'a PackageMap, addons: &'a PackageMap) -> Vec<&'a Package> {
    let mut ordered: Vec<&Package> = modules.values().filter(|p| p.is_enabled()).collect();
    ordered.sort_by(|a, b| module_order(a, b));

    // PackageMap iterates in identity order, which for addons is name order.
    ordered.extend(addons.values().filter(|p| p.is_enabled()));
    ordered
}

/// Computes the ordered resource list with generated entries prefixed by
/// `prefix` (the path from the list's directory back to the root, e.g.
/// `"../../../"`).
#[must_use]
pub fn compute_resource_list_with_prefix(
    modules: &PackageMap,
    addons: &PackageMap,
    existing: &[String],
    prefix: &str,
) -> Vec<String> {
    let generated = ordered_packages(modules, addons)
        .into_iter()
        .map(|package| format!("{prefix}{}", resource_path(package)));

    let retained = existing.iter().filter(|entry| !is_generated_entry(entry)).cloned();

    generated.chain(retained).collect()
}

/// Computes the ordered resource list with root-relative generated entries.
#[must_use]
pub fn compute_resource_list(
    modules: &PackageMap,
    addons: &PackageMap,
    existing: &[String],
) -> Vec<String> {
    compute_resource_list_with_prefix(modules, addons, existing, "")
}
