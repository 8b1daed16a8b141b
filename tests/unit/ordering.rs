//! Properties of resource ordering.

use kvendor_cli::config::{Package, PackageMap, package_map};
use kvendor_cli::ordering::{compute_resource_list, is_generated_entry, ordered_packages};

fn weighted(entries: &[(&str, i64, bool)]) -> PackageMap {
    package_map(entries.iter().map(|(name, weight, disabled)| {
        let package = Package::module(*name, "f", "1", *weight);
        if *disabled { package.disabled() } else { package }
    }))
}

#[test]
fn test_modules_strictly_ordered_by_weight_then_name() {
    let modules = weighted(&[
        ("delta", 3, false),
        ("alpha", 3, false),
        ("zulu", -1, false),
        ("echo", 0, true),
        ("bravo", 10, false),
        ("charlie", 0, false),
    ]);

    let no_addons = PackageMap::new();
    let ordered = ordered_packages(&modules, &no_addons);
    for pair in ordered.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(
            (a.weight, &a.id.name) < (b.weight, &b.id.name),
            "{} must come before {}",
            a.id,
            b.id
        );
    }
    assert!(ordered.iter().all(|p| !p.disabled));
    assert_eq!(ordered.len(), 5);
}

#[test]
fn test_addons_strictly_lexicographic() {
    let addons = package_map([
        Package::addon("monitoring", "1"),
        Package::addon("cert-manager", "1"),
        Package::addon("ingress", "1").disabled(),
        Package::addon("external-dns", "1"),
    ]);

    let list = compute_resource_list(&PackageMap::new(), &addons, &[]);
    assert_eq!(list, vec![
        "vendors/add-ons/cert-manager-1",
        "vendors/add-ons/external-dns-1",
        "vendors/add-ons/monitoring-1",
    ]);
}

#[test]
fn test_hand_authored_entries_keep_relative_order() {
    let existing: Vec<String> = [
        "z-first.yaml",
        "vendors/modules/old-1/f",
        "a-second.yaml",
        "../../../vendors/add-ons/gone-2",
        "patches/third.yaml",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();

    let list = compute_resource_list(&weighted(&[("m", 0, false)]), &PackageMap::new(), &existing);
    assert_eq!(list, vec![
        "vendors/modules/m-1/f",
        "z-first.yaml",
        "a-second.yaml",
        "patches/third.yaml",
    ]);
}

#[test]
fn test_regeneration_is_a_fixed_point() {
    let modules = weighted(&[("a", 2, false), ("b", 1, false)]);
    let addons = package_map([Package::addon("x", "1")]);
    let existing = vec!["manual.yaml".to_string()];

    let first = compute_resource_list(&modules, &addons, &existing);
    let second = compute_resource_list(&modules, &addons, &first);
    assert_eq!(first, second);
}

#[test]
fn test_generated_entry_convention() {
    assert!(is_generated_entry("vendors/add-ons/x-1"));
    assert!(is_generated_entry("../../../../vendors/modules/x-1/f"));
    assert!(!is_generated_entry("vendors.yaml"));
    assert!(!is_generated_entry("my-manual-resource.yaml"));
}
