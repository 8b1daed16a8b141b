//! Common helpers for the kvendor test suites.

// Not every suite uses every helper.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use kvendor_cli::config::{ConfigSpec, parse_config};
use kvendor_cli::kustomization::Kustomization;

/// Parses an inline configuration document, panicking on failure.
pub fn config(yaml: &str) -> ConfigSpec {
    parse_config(yaml, "test").expect("test configuration should parse")
}

/// Resources of the shared scope's generated list below `root`.
pub fn shared_resources(root: &Path) -> Vec<String> {
    load(&root.join("clusters/all-groups/bases/kustomization.yaml"))
}

/// Resources of a cluster's generated list below `root`.
pub fn cluster_resources(root: &Path, group: &str, cluster: &str) -> Vec<String> {
    load(&cluster_bases(root, group, cluster).join("kustomization.yaml"))
}

pub fn cluster_bases(root: &Path, group: &str, cluster: &str) -> PathBuf {
    root.join("clusters").join(group).join(cluster).join("bases")
}

fn load(path: &Path) -> Vec<String> {
    Kustomization::load_or_new(path).expect("generated file should parse").resources()
}

/// Relative paths of every file below `dir`, sorted.
pub fn files_below(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .expect("walked path is below dir")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}
