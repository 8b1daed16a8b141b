//! Tool settings: where packages come from and how hard to work.
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. `~/.kvendor/config.toml` (or `%LOCALAPPDATA%\kvendor\config.toml`), or the
//!    file given with `--settings`
//! 3. Environment: `KVENDOR_UPSTREAM_URL`, `KVENDOR_MAX_PARALLEL`
//! 4. Command-line flags (applied by the CLI)
//!
//! ```toml
//! upstream_url = "https://github.com/example/catalog.git"
//! max_parallel = 8
//! git_timeout_secs = 300
//! render_command = ["kustomize", "build"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::{DEFAULT_UPSTREAM_URL, GIT_CLONE_TIMEOUT, default_max_parallel};

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

const fn default_git_timeout_secs() -> u64 {
    GIT_CLONE_TIMEOUT.as_secs()
}

fn default_render_command() -> Vec<String> {
    vec!["kustomize".to_string(), "build".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Repository holding every package, addressed by tag.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Concurrent fetch+materialize units; `None` picks a CPU-based default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,

    /// Timeout applied to each clone.
    #[serde(default = "default_git_timeout_secs")]
    pub git_timeout_secs: u64,

    /// Program and leading arguments of the manifest build tool.
    #[serde(default = "default_render_command")]
    pub render_command: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            max_parallel: None,
            git_timeout_secs: default_git_timeout_secs(),
            render_command: default_render_command(),
        }
    }
}

impl Settings {
    /// Loads settings from `path` (or the default location) and applies the
    /// environment overrides. A missing file yields the defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().ok(),
        };

        let mut settings = match path {
            Some(path) if path.exists() => Self::load_from(&path).await?,
            _ => Self::default(),
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    /// Applies `KVENDOR_*` overrides read through `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(url) = lookup("KVENDOR_UPSTREAM_URL").filter(|u| !u.trim().is_empty()) {
            tracing::debug!("Upstream URL overridden by environment");
            self.upstream_url = url;
        }
        if let Some(value) = lookup("KVENDOR_MAX_PARALLEL") {
            let parsed: usize = value
                .trim()
                .parse()
                .with_context(|| format!("KVENDOR_MAX_PARALLEL is not a number: '{value}'"))?;
            self.max_parallel = Some(parsed.max(1));
        }
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("kvendor")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".kvendor")
        };

        Ok(config_dir.join("config.toml"))
    }

    #[must_use]
    pub fn effective_max_parallel(&self) -> usize {
        self.max_parallel.unwrap_or_else(default_max_parallel).max(1)
    }

    #[must_use]
    pub const fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }
}
