//! End-to-end tests of the `kvendor` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use kvendor_cli::test_utils::UpstreamFixture;

use crate::common::cluster_resources;

const FLEET: &str = r#"
apiVersion: kvendor.io/v1alpha1
kind: ClusterConfig
name: fleet
spec:
  modules:
    "m1/small": { version: "0.1.0", weight: 1 }
  addons:
    ingress: { version: "1.2.0" }
  groups:
    - name: dev
      clusters:
        - name: dev-1
          context: kind-dev-1
          addons:
            ingress: { disabled: true }
"#;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new(config: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kvendor.yaml"), config).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn settings(&self, content: &str) -> PathBuf {
        let path = self.root().join("settings.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    /// `kvendor` isolated from the caller's environment and settings.
    fn kvendor(&self) -> Command {
        self.kvendor_with(&self.root().join("missing-settings.toml"))
    }

    fn kvendor_with(&self, settings: &Path) -> Command {
        let mut cmd = Command::cargo_bin("kvendor").unwrap();
        cmd.current_dir(self.root())
            .env_remove("KVENDOR_UPSTREAM_URL")
            .env_remove("KVENDOR_MAX_PARALLEL")
            .env_remove("KVENDOR_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.root().join("kvendor.yaml"))
            .arg("--settings")
            .arg(settings)
            .arg("--no-progress");
        cmd
    }
}

#[test]
fn test_sync_without_download() {
    let project = Project::new(FLEET);

    project
        .kvendor()
        .args(["sync", "--no-download"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Synchronized 'fleet'"))
        .stdout(predicate::str::contains("Downloads skipped"));

    assert_eq!(cluster_resources(project.root(), "dev", "dev-1"), vec![
        "../../../../vendors/modules/m1-0.1.0/small"
    ]);
    assert!(!project.root().join("vendors").exists());
}

#[test]
fn test_sync_vendors_from_upstream_flag() {
    let upstream = UpstreamFixture::new().unwrap();
    upstream.publish_module("m1", "0.1.0", &["small"]).unwrap();
    upstream.publish_addon("ingress", "1.2.0").unwrap();
    let project = Project::new(FLEET);

    project
        .kvendor()
        .args(["sync", "--max-parallel", "2", "--upstream"])
        .arg(upstream.url())
        .assert()
        .success()
        .stdout(predicate::str::contains("Vendored 2 packages"));

    assert!(project.root().join("vendors/modules/m1-0.1.0/small/kustomization.yaml").is_file());
    assert!(project.root().join("vendors/add-ons/ingress-1.2.0/manifest.yaml").is_file());
}

#[test]
fn test_sync_reports_missing_tag() {
    let upstream = UpstreamFixture::new().unwrap();
    upstream.publish_addon("ingress", "1.2.0").unwrap();
    let project = Project::new(FLEET);

    project
        .kvendor()
        .args(["sync", "--upstream"])
        .arg(upstream.url())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("module-m1-0.1.0"));
}

#[test]
fn test_list_cluster_as_json() {
    let project = Project::new(FLEET);

    let output = project.kvendor().args(["list", "dev", "dev-1", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let scopes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(scopes[0]["scope"], "dev/dev-1");
    assert_eq!(scopes[0]["context"], "kind-dev-1");
    let packages = scopes[0]["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["name"], "m1");
    assert_eq!(packages[0]["flavor"], "small");
    assert_eq!(packages[0]["path"], "vendors/modules/m1-0.1.0/small");
}

#[test]
fn test_list_shared_scope_as_text() {
    let project = Project::new(FLEET);

    project
        .kvendor()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("all-groups"))
        .stdout(predicate::str::contains("m1/small"))
        .stdout(predicate::str::contains("vendors/add-ons/ingress-1.2.0"));
}

#[test]
fn test_build_unknown_cluster_fails() {
    let project = Project::new(FLEET);

    project
        .kvendor()
        .args(["build", "dev", "dev-9"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("dev-9"));
}

#[cfg(unix)]
#[test]
fn test_build_runs_configured_renderer() {
    let project = Project::new(FLEET);
    let settings = project.settings("render_command = [\"ls\"]\n");

    project.kvendor().args(["sync", "--no-download"]).assert().success();

    project
        .kvendor_with(&settings)
        .args(["build", "dev", "dev-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bases"))
        .stdout(predicate::str::contains("kustomization.yaml"));
}

#[test]
fn test_invalid_config_fails() {
    let project = Project::new("apiVersion: kvendor.io/v1alpha1\nkind: Something\nname: x\nspec: {}\n");

    project
        .kvendor()
        .args(["sync", "--no-download"])
        .assert()
        .failure()
        .code(1);
    assert!(!project.root().join("clusters").exists());
}
