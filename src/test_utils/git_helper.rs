//! Git test helper utilities
//!
//! [`TestGit`] wraps the few git commands tests need to build repositories.
//! [`UpstreamFixture`] builds a local package catalogue with the tag layout
//! kvendor fetches from, reachable through a `file://` URL.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use crate::utils::file_url;

/// Git command wrapper for tests.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    pub fn init(&self) -> Result<()> {
        self.run_git_command(&["init", "--quiet"], "Failed to initialize git repository")?;
        Ok(())
    }

    /// Configures an identity and disables signing so commits work anywhere.
    pub fn config_user(&self) -> Result<()> {
        for (key, value) in [
            ("user.email", "test@kvendor.example"),
            ("user.name", "Test User"),
            ("commit.gpgsign", "false"),
            ("tag.gpgsign", "false"),
        ] {
            self.run_git_command(&["config", key, value], &format!("Failed to set {key}"))?;
        }
        Ok(())
    }

    pub fn add_all(&self) -> Result<()> {
        self.run_git_command(&["add", "--all", "."], "Failed to add files to git")?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_git_command(
            &["commit", "--quiet", "--allow-empty", "-m", message],
            "Failed to create git commit",
        )?;
        Ok(())
    }

    pub fn tag(&self, tag_name: &str) -> Result<()> {
        self.run_git_command(&["tag", tag_name], &format!("Failed to create tag: {tag_name}"))?;
        Ok(())
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

/// A local upstream catalogue of tagged package trees.
///
/// Each [`publish`](Self::publish) replaces the package directory, commits
/// the whole repository and tags the commit, mirroring how packages are
/// released upstream.
pub struct UpstreamFixture {
    _temp: TempDir,
    git: TestGit,
}

impl UpstreamFixture {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("Failed to create upstream directory")?;
        let git = TestGit::new(temp.path().join("catalog"));
        std::fs::create_dir_all(git.repo_path())?;
        git.init()?;
        git.config_user()?;
        Ok(Self {
            _temp: temp,
            git,
        })
    }

    /// `file://` URL of the catalogue.
    pub fn url(&self) -> String {
        file_url(self.git.repo_path())
    }

    pub fn path(&self) -> &Path {
        self.git.repo_path()
    }

    /// Writes `files` (relative to `package_dir`, e.g. `modules/m1`), commits
    /// and tags the result with `tag`.
    pub fn publish(&self, package_dir: &str, tag: &str, files: &[(&str, &str)]) -> Result<()> {
        let dir = self.path().join(package_dir);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        for (relative, content) in files {
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
        }
        self.git.add_all()?;
        self.git.commit(&format!("Release {tag}"))?;
        self.git.tag(tag)
    }

    /// Publishes a module version with one `kustomization.yaml` per flavor.
    pub fn publish_module(&self, name: &str, version: &str, flavors: &[&str]) -> Result<()> {
        let files: Vec<(String, String)> = flavors
            .iter()
            .flat_map(|flavor| {
                [
                    (
                        format!("{flavor}/kustomization.yaml"),
                        "resources:\n- deployment.yaml\n".to_string(),
                    ),
                    (
                        format!("{flavor}/deployment.yaml"),
                        format!("# {name} {version} {flavor}\nkind: Deployment\n"),
                    ),
                ]
            })
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
        self.publish(
            &format!("modules/{name}"),
            &format!("module-{}-{version}", name.replace('/', "-")),
            &refs,
        )
    }

    /// Publishes an addon version with a `kustomization.yaml`.
    pub fn publish_addon(&self, name: &str, version: &str) -> Result<()> {
        let manifest = format!("# {name} {version}\nkind: ConfigMap\n");
        self.publish(
            &format!("add-ons/{name}"),
            &format!("addon-{}-{version}", name.replace('/', "-")),
            &[
                ("kustomization.yaml", "resources:\n- manifest.yaml\n"),
                ("manifest.yaml", &manifest),
            ],
        )
    }

    /// Creates a tag pointing at the current commit without touching files.
    pub fn tag_only(&self, tag: &str) -> Result<()> {
        self.git.tag(tag)
    }
}
