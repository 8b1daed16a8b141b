//! Fetching package trees from a local upstream.

use std::time::Duration;

use kvendor_cli::config::Package;
use kvendor_cli::core::{CancelToken, KvendorError};
use kvendor_cli::source::VersionedSourceFetcher;
use kvendor_cli::test_utils::{TestGit, UpstreamFixture, init_test_logging};

fn fetcher(upstream: &UpstreamFixture) -> VersionedSourceFetcher {
    VersionedSourceFetcher::new(upstream.url(), Duration::from_secs(60))
}

fn kind_of(err: &anyhow::Error) -> Option<&KvendorError> {
    err.downcast_ref::<KvendorError>()
}

#[tokio::test]
async fn test_fetch_addon_tree() {
    init_test_logging(None);
    let upstream = UpstreamFixture::new().unwrap();
    upstream.publish_addon("ingress", "1.2.0").unwrap();

    let tree = fetcher(&upstream)
        .fetch_package_tree(&Package::addon("ingress", "1.2.0"), &CancelToken::new())
        .await
        .unwrap();

    let files: Vec<_> = tree.files().into_iter().map(|f| f.relative_path).collect();
    assert_eq!(files, vec!["kustomization.yaml", "manifest.yaml"]);
}

#[tokio::test]
async fn test_fetch_pins_exact_tag() {
    init_test_logging(None);
    let upstream = UpstreamFixture::new().unwrap();
    upstream.publish_module("cat/name", "1.0.0", &["small"]).unwrap();
    upstream.publish_module("cat/name", "2.0.0", &["small", "large"]).unwrap();

    let fetcher = fetcher(&upstream);
    let cancel = CancelToken::new();

    let old = fetcher
        .fetch_package_tree(&Package::module("cat/name", "small", "1.0.0", 0), &cancel)
        .await
        .unwrap();
    let paths: Vec<_> = old.files().into_iter().map(|f| f.relative_path).collect();
    assert_eq!(paths, vec!["small/deployment.yaml", "small/kustomization.yaml"]);

    let err = fetcher
        .fetch_package_tree(&Package::module("cat/name", "large", "1.0.0", 0), &cancel)
        .await
        .unwrap_err();
    assert!(
        matches!(kind_of(&err), Some(KvendorError::PackageNotFound { name, .. }) if name == "cat/name/large"),
        "unexpected error: {err:#}"
    );

    let new = fetcher
        .fetch_package_tree(&Package::module("cat/name", "large", "2.0.0", 0), &cancel)
        .await
        .unwrap();
    assert_eq!(new.files().len(), 4);
}

#[tokio::test]
async fn test_missing_tag_is_tag_not_found() {
    init_test_logging(None);
    let upstream = UpstreamFixture::new().unwrap();
    upstream.publish_addon("ingress", "1.2.0").unwrap();

    let err = fetcher(&upstream)
        .fetch_package_tree(&Package::addon("ingress", "9.9.9"), &CancelToken::new())
        .await
        .unwrap_err();
    assert!(
        matches!(kind_of(&err), Some(KvendorError::TagNotFound { tag, .. }) if tag == "addon-ingress-9.9.9"),
        "unexpected error: {err:#}"
    );
}

#[tokio::test]
async fn test_tag_without_subtree_is_package_not_found() {
    init_test_logging(None);
    let upstream = UpstreamFixture::new().unwrap();
    upstream.publish_addon("ingress", "1.2.0").unwrap();
    upstream.tag_only("addon-dns-0.1.0").unwrap();
    // A sibling whose name shares a prefix must not count as the package.
    upstream.publish_addon("dns-extra", "0.1.0").unwrap();
    upstream.tag_only("addon-dns-0.2.0").unwrap();

    let fetcher = fetcher(&upstream);
    for version in ["0.1.0", "0.2.0"] {
        let err = fetcher
            .fetch_package_tree(&Package::addon("dns", version), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(
            matches!(kind_of(&err), Some(KvendorError::PackageNotFound { .. })),
            "unexpected error: {err:#}"
        );
    }
}

#[tokio::test]
async fn test_unreachable_upstream_is_clone_failure() {
    init_test_logging(None);
    let temp = tempfile::tempdir().unwrap();
    let url = kvendor_cli::utils::file_url(&temp.path().join("missing"));

    let err = VersionedSourceFetcher::new(url, Duration::from_secs(60))
        .fetch_package_tree(&Package::addon("a", "1"), &CancelToken::new())
        .await
        .unwrap_err();
    assert!(
        matches!(
            kind_of(&err),
            Some(KvendorError::GitCloneFailed { .. } | KvendorError::TagNotFound { .. })
        ),
        "unexpected error: {err:#}"
    );
}

#[tokio::test]
async fn test_cancelled_fetch() {
    init_test_logging(None);
    let upstream = UpstreamFixture::new().unwrap();
    upstream.publish_addon("ingress", "1.2.0").unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = fetcher(&upstream)
        .fetch_package_tree(&Package::addon("ingress", "1.2.0"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(kind_of(&err), Some(KvendorError::Cancelled)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinks_are_skipped_and_exec_bit_kept() {
    use std::os::unix::fs::PermissionsExt;

    init_test_logging(None);
    let upstream = UpstreamFixture::new().unwrap();
    upstream.publish_addon("tools", "1.0.0").unwrap();

    let dir = upstream.path().join("add-ons/tools");
    std::os::unix::fs::symlink("/etc/passwd", dir.join("passwd")).unwrap();
    let script = dir.join("run.sh");
    std::fs::write(&script, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let git = TestGit::new(upstream.path());
    git.add_all().unwrap();
    git.commit("tools 1.0.1").unwrap();
    git.tag("addon-tools-1.0.1").unwrap();

    let tree = fetcher(&upstream)
        .fetch_package_tree(&Package::addon("tools", "1.0.1"), &CancelToken::new())
        .await
        .unwrap();
    let files = tree.files();
    assert!(files.iter().all(|f| f.relative_path != "passwd"));
    let run = files.iter().find(|f| f.relative_path == "run.sh").unwrap();
    assert!(run.executable);
}
