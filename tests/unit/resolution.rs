//! Properties of override resolution.

use kvendor_cli::config::{Package, PackageMap, package_map};
use kvendor_cli::resolver::resolve;

fn modules(entries: &[(&str, &str, bool)]) -> PackageMap {
    package_map(entries.iter().map(|(name, version, disabled)| {
        let package = Package::module(*name, "f", *version, 0);
        if *disabled { package.disabled() } else { package }
    }))
}

/// Checks: output = (defaults keys absent from overrides) ∪ (enabled overrides).
fn assert_resolution_law(defaults: &PackageMap, overrides: &PackageMap) {
    let resolved = resolve(defaults, overrides);

    for (id, package) in overrides {
        if package.disabled {
            assert!(!resolved.contains_key(id), "{id} was disabled by override");
        } else {
            assert_eq!(resolved.get(id), Some(package), "{id} should be the override");
        }
    }
    for (id, package) in defaults {
        if !overrides.contains_key(id) {
            assert_eq!(resolved.get(id), Some(package), "{id} should pass through");
        }
    }
    let expected = defaults.keys().filter(|id| !overrides.contains_key(*id)).count()
        + overrides.values().filter(|p| !p.disabled).count();
    assert_eq!(resolved.len(), expected);
}

#[test]
fn test_resolution_law_over_combinations() {
    let names = ["a", "b", "c", "d"];
    // Every package is absent, enabled or disabled on either side.
    for mask in 0..(3u32.pow(8)) {
        let mut defaults = Vec::new();
        let mut overrides = Vec::new();
        let mut rest = mask;
        for (i, name) in names.iter().enumerate() {
            match rest % 3 {
                1 => defaults.push((*name, "1", false)),
                2 => defaults.push((*name, "1", i % 2 == 0)),
                _ => {}
            }
            rest /= 3;
            match rest % 3 {
                1 => overrides.push((*name, "2", false)),
                2 => overrides.push((*name, "2", true)),
                _ => {}
            }
            rest /= 3;
        }
        assert_resolution_law(&modules(&defaults), &modules(&overrides));
    }
}

#[test]
fn test_disabled_override_wins_over_enabled_default() {
    let defaults = modules(&[("a", "1", false)]);
    let overrides = modules(&[("a", "", true)]);
    assert!(resolve(&defaults, &overrides).is_empty());
}

#[test]
fn test_default_disabled_is_kept_for_ordering_to_filter() {
    let defaults = modules(&[("a", "1", true)]);
    let resolved = resolve(&defaults, &PackageMap::new());
    assert!(resolved.values().all(|p| p.disabled));
    assert_eq!(resolved.len(), 1);
}
