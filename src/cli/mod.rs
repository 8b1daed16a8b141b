//! Command-line interface for kvendor.
//!
//! The CLI is a thin surface over the library: it locates the configuration
//! document and tool settings, then hands off to [`crate::sync`],
//! [`crate::render`] or the resolver.
//!
//! # Commands
//!
//! - `sync` - regenerate resource lists and vendor every referenced package
//! - `build` - render one cluster with the configured build tool
//! - `list` - show the resolved, ordered package set of a scope
//!
//! ```bash
//! kvendor sync                       # lists + vendors
//! kvendor sync --no-download         # lists only
//! kvendor build dev dev-1 > out.yaml
//! kvendor list dev dev-1 --format json
//! ```
//!
//! # Global flags
//!
//! `--config` picks the configuration document (default `kvendor.yaml`),
//! `--root` the destination root (default: the document's directory) and
//! `--settings` the tool settings file. `--verbose`/`--quiet` set the log
//! level unless `RUST_LOG` is set.

pub mod build;
pub mod list;
pub mod sync;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigSpec, Settings, load_config};
use crate::constants::DEFAULT_CONFIG_FILE;
use crate::core::CancelToken;

/// Resolve cluster package sets and vendor versioned package trees.
#[derive(Parser, Debug)]
#[command(
    name = "kvendor",
    about = "Resolve per-cluster package sets and vendor versioned package trees",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration document
    #[arg(long, global = true, env = "KVENDOR_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Destination root (defaults to the configuration's directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Tool settings file (defaults to ~/.kvendor/config.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Regenerate resource lists and vendor packages
    Sync(sync::SyncCommand),
    /// Render one cluster with the build tool
    Build(build::BuildCommand),
    /// Show the resolved package set of a scope
    List(list::ListCommand),
}

/// Values every subcommand needs, resolved from the global flags.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config_path: PathBuf,
    pub root: PathBuf,
    pub settings: Settings,
    pub progress: bool,
    pub cancel: CancelToken,
}

impl CommandContext {
    pub fn load_config(&self) -> Result<ConfigSpec> {
        load_config(&self.config_path)
    }
}

impl Cli {
    /// Log filter directive implied by the verbosity flags.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Installs the global tracing subscriber. `RUST_LOG` wins over flags.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(self.verbose)
            .try_init();
    }

    /// Runs the selected command.
    pub async fn execute(self, cancel: CancelToken) -> Result<()> {
        let settings = Settings::load(self.settings.as_deref()).await?;
        let root = match &self.root {
            Some(root) => root.clone(),
            None => default_root(&self.config),
        };
        let ctx = CommandContext {
            config_path: self.config.clone(),
            root,
            settings,
            progress: !self.no_progress && !self.quiet,
            cancel,
        };
        tracing::debug!("Using configuration {} and root {}", ctx.config_path.display(), ctx.root.display());

        match self.command {
            Commands::Sync(cmd) => cmd.execute(ctx).await,
            Commands::Build(cmd) => cmd.execute(ctx).await,
            Commands::List(cmd) => cmd.execute(ctx).await,
        }
    }
}

fn default_root(config: &Path) -> PathBuf {
    match config.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
