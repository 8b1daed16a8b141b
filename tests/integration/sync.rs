//! Full synchronization against a local upstream.

use std::path::Path;

use kvendor_cli::config::{ConfigSpec, Settings};
use kvendor_cli::core::KvendorError;
use kvendor_cli::sync::{SyncOptions, sync};
use kvendor_cli::test_utils::{UpstreamFixture, init_test_logging};

use crate::common::{cluster_bases, cluster_resources, config, files_below, shared_resources};

const FLEET: &str = r#"
apiVersion: kvendor.io/v1alpha1
kind: ClusterConfig
name: fleet
spec:
  modules:
    "monitoring/small": { version: "0.1.0", weight: 1 }
    "base/default": { version: "1.0.0", weight: -1 }
  addons:
    ingress: { version: "1.2.0" }
  groups:
    - name: dev
      clusters:
        - name: dev-1
          context: kind-dev-1
          modules:
            "monitoring/small": { version: "0.1.1", weight: 1 }
          addons:
            ingress: { disabled: true }
        - name: dev-2
          context: kind-dev-2
          modules:
            "monitoring/large": { version: "0.1.1", weight: 5 }
    - name: prod
      clusters:
        - name: prod-1
          context: gke-prod-1
"#;

fn upstream() -> UpstreamFixture {
    let upstream = UpstreamFixture::new().unwrap();
    upstream.publish_module("base", "1.0.0", &["default"]).unwrap();
    upstream.publish_module("monitoring", "0.1.0", &["small"]).unwrap();
    upstream.publish_module("monitoring", "0.1.1", &["small", "large"]).unwrap();
    upstream.publish_addon("ingress", "1.2.0").unwrap();
    upstream
}

fn options(upstream: &UpstreamFixture, download: bool) -> SyncOptions {
    let mut options = SyncOptions::from_settings(&Settings::default()).with_download(download);
    options.upstream_url = upstream.url();
    options.max_parallel = 4;
    options
}

async fn run(config: &ConfigSpec, root: &Path, options: &SyncOptions) {
    sync(config, root, options).await.unwrap();
}

#[tokio::test]
async fn test_sync_writes_lists_and_vendors() {
    init_test_logging(None);
    let upstream = upstream();
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    let config = config(FLEET);

    let report = sync(&config, root, &options(&upstream, true)).await.unwrap();
    assert_eq!(report.clusters, 3);

    assert_eq!(shared_resources(root), vec![
        "../../../vendors/modules/base-1.0.0/default",
        "../../../vendors/modules/monitoring-0.1.0/small",
        "../../../vendors/add-ons/ingress-1.2.0",
    ]);
    assert_eq!(cluster_resources(root, "dev", "dev-1"), vec![
        "../../../../vendors/modules/base-1.0.0/default",
        "../../../../vendors/modules/monitoring-0.1.1/small",
    ]);
    assert_eq!(cluster_resources(root, "dev", "dev-2"), vec![
        "../../../../vendors/modules/base-1.0.0/default",
        "../../../../vendors/modules/monitoring-0.1.0/small",
        "../../../../vendors/modules/monitoring-0.1.1/large",
        "../../../../vendors/add-ons/ingress-1.2.0",
    ]);
    assert!(root.join("clusters/prod/prod-1/kustomization.yaml").is_file());

    let vendored: Vec<_> = report.vendored.unwrap().into_iter().map(|u| u.dir).collect();
    assert_eq!(vendored, vec![
        "vendors/add-ons/ingress-1.2.0",
        "vendors/modules/base-1.0.0",
        "vendors/modules/monitoring-0.1.0",
        "vendors/modules/monitoring-0.1.1",
    ]);

    // Both flavors of 0.1.1 come from one fetch of the module tree.
    assert_eq!(files_below(&root.join("vendors/modules/monitoring-0.1.1")), vec![
        "large/deployment.yaml",
        "large/kustomization.yaml",
        "small/deployment.yaml",
        "small/kustomization.yaml",
    ]);
    let content =
        std::fs::read_to_string(root.join("vendors/modules/monitoring-0.1.0/small/deployment.yaml"))
            .unwrap();
    assert!(content.contains("monitoring 0.1.0 small"));
    assert!(root.join("vendors/add-ons/ingress-1.2.0/kustomization.yaml").is_file());
}

#[tokio::test]
async fn test_every_relative_resource_resolves_after_download() {
    init_test_logging(None);
    let upstream = upstream();
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    let config = config(FLEET);

    run(&config, root, &options(&upstream, true)).await;

    for (group, cluster) in [("dev", "dev-1"), ("dev", "dev-2"), ("prod", "prod-1")] {
        let bases = cluster_bases(root, group, cluster);
        for entry in cluster_resources(root, group, cluster) {
            assert!(bases.join(&entry).is_dir(), "{entry} should exist from {group}/{cluster}");
        }
    }
}

#[tokio::test]
async fn test_vendor_root_is_rebuilt_from_scratch() {
    init_test_logging(None);
    let upstream = upstream();
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    let stale = root.join("vendors/modules/monitoring-0.0.1/small/old.yaml");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "old").unwrap();

    run(&config(FLEET), root, &options(&upstream, true)).await;
    assert!(!stale.exists());
    assert!(!root.join("vendors/modules/monitoring-0.0.1").exists());
}

#[tokio::test]
async fn test_sync_without_download_is_idempotent_and_leaves_vendors() {
    init_test_logging(None);
    let upstream = upstream();
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    let marker = root.join("vendors/keep.txt");
    std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
    std::fs::write(&marker, "kept").unwrap();
    let config = config(FLEET);

    run(&config, root, &options(&upstream, false)).await;
    let snapshot = |root: &Path| -> Vec<(String, Vec<u8>)> {
        files_below(&root.join("clusters"))
            .into_iter()
            .map(|f| {
                let bytes = std::fs::read(root.join("clusters").join(&f)).unwrap();
                (f, bytes)
            })
            .collect()
    };
    let first = snapshot(root);

    let report = sync(&config, root, &options(&upstream, false)).await.unwrap();
    assert_eq!(report.files_written, 0);
    assert_eq!(snapshot(root), first);
    assert!(marker.exists());
}

#[tokio::test]
async fn test_hand_authored_content_survives_sync() {
    init_test_logging(None);
    let upstream = upstream();
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    let bases = cluster_bases(root, "dev", "dev-1");
    std::fs::create_dir_all(&bases).unwrap();
    std::fs::write(
        bases.join("kustomization.yaml"),
        "apiVersion: kustomize.config.k8s.io/v1beta1\nkind: Kustomization\nnamePrefix: dev-\nresources:\n- ../../../../vendors/modules/monitoring-0.0.9/small\n- my-manual-resource.yaml\n- extra/\n",
    )
    .unwrap();
    let overlay = root.join("clusters/dev/dev-1/kustomization.yaml");
    std::fs::write(&overlay, "resources:\n- patch.yaml\n").unwrap();

    run(&config(FLEET), root, &options(&upstream, false)).await;

    assert_eq!(cluster_resources(root, "dev", "dev-1"), vec![
        "../../../../vendors/modules/base-1.0.0/default",
        "../../../../vendors/modules/monitoring-0.1.1/small",
        "my-manual-resource.yaml",
        "extra/",
    ]);
    let content = std::fs::read_to_string(bases.join("kustomization.yaml")).unwrap();
    assert!(content.contains("namePrefix: dev-"));
    let overlay = std::fs::read_to_string(&overlay).unwrap();
    assert_eq!(overlay, "resources:\n- bases\n- patch.yaml\n");
}

#[tokio::test]
async fn test_missing_package_aborts_with_context() {
    init_test_logging(None);
    let upstream = upstream();
    let temp = tempfile::tempdir().unwrap();
    let config = config(
        r#"
apiVersion: kvendor.io/v1alpha1
kind: ClusterConfig
name: broken
spec:
  addons:
    ingress: { version: "1.2.0" }
    ghost: { version: "9.9.9" }
"#,
    );

    let mut options = options(&upstream, true);
    options.max_parallel = 1;
    let err = sync(&config, temp.path(), &options).await.unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Failed to vendor addon 'ghost' at version 9.9.9"), "{message}");
    assert!(matches!(
        err.downcast_ref::<KvendorError>(),
        Some(KvendorError::TagNotFound { tag, .. }) if tag == "addon-ghost-9.9.9"
    ));
    assert!(!temp.path().join("vendors/add-ons/ghost-9.9.9").exists());
}
