//! Worked resolution and ordering scenarios.

use kvendor_cli::config::{Package, PackageId, PackageMap, package_map};
use kvendor_cli::ordering::compute_resource_list;
use kvendor_cli::resolver::{ResolvedScope, resolve};
use kvendor_cli::sync::{fetch_plan, plan_scopes};

use crate::common;

#[test]
fn test_cluster_override_replaces_default_version() {
    let defaults = package_map([Package::module("m1", "flavor1", "v0.1.0", 1)]);
    let overrides = package_map([Package::module("m1", "flavor1", "v0.1.1", 1)]);

    let resolved = resolve(&defaults, &overrides);
    assert_eq!(resolved.len(), 1);
    let m1 = &resolved[&PackageId::module("m1", "flavor1")];
    assert_eq!((m1.version.as_str(), m1.weight), ("v0.1.1", 1));

    let list = compute_resource_list(&resolved, &PackageMap::new(), &[]);
    assert_eq!(list, vec!["vendors/modules/m1-v0.1.1/flavor1"]);
}

#[test]
fn test_weights_order_modules_and_drop_disabled() {
    let modules = package_map([
        Package::module("m4", "f", "1", 4),
        Package::module("m1", "f", "1", 1),
        Package::module("m3", "f", "1", 3),
        Package::module("m2", "f", "1", 2),
        Package::module("m0", "f", "1", 10).disabled(),
    ]);

    let list = compute_resource_list(&modules, &PackageMap::new(), &[]);
    assert_eq!(list, vec![
        "vendors/modules/m1-1/f",
        "vendors/modules/m2-1/f",
        "vendors/modules/m3-1/f",
        "vendors/modules/m4-1/f",
    ]);
}

#[test]
fn test_disabled_addon_override_excludes_it_from_cluster_plan() {
    let config = common::config(
        r#"
apiVersion: kvendor.io/v1alpha1
kind: ClusterConfig
name: fleet
spec:
  addons:
    addon1: { version: "v0.1.0" }
  groups:
    - name: dev
      clusters:
        - name: dev-1
          context: kind-dev-1
          addons:
            addon1: { disabled: true }
"#,
    );
    let cluster = config.cluster("dev", "dev-1").unwrap();
    let scope = ResolvedScope::cluster(&config, cluster);
    assert!(scope.addons.is_empty());

    let cluster_plan = plan_scopes([scope]).unwrap();
    assert!(cluster_plan.is_empty());

    // The shared scope still references it, so the overall plan does.
    let plan = fetch_plan(&config).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].dir, "vendors/add-ons/addon1-v0.1.0");
}

#[test]
fn test_stale_vendor_entry_superseded_manual_entry_kept() {
    let modules = package_map([Package::module("m1", "flavor1", "0.1.1", 0)]);
    let existing = vec![
        "vendors/modules/m1-0.1.0/flavor1".to_string(),
        "my-manual-resource.yaml".to_string(),
    ];

    let list = compute_resource_list(&modules, &PackageMap::new(), &existing);
    assert_eq!(list, vec!["vendors/modules/m1-0.1.1/flavor1", "my-manual-resource.yaml"]);
}
