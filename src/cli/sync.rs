//! `kvendor sync`: regenerate resource lists and vendor packages.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CommandContext;
use crate::sync::{SyncOptions, sync};

#[derive(Args, Debug)]
pub struct SyncCommand {
    /// Only rewrite resource lists; leave vendors/ untouched
    #[arg(long)]
    no_download: bool,

    /// Maximum number of packages fetched concurrently
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    max_parallel: Option<u16>,

    /// Upstream package repository (overrides settings)
    #[arg(long)]
    upstream: Option<String>,
}

impl SyncCommand {
    pub async fn execute(self, ctx: CommandContext) -> Result<()> {
        let config = ctx.load_config()?;

        let mut options = SyncOptions::from_settings(&ctx.settings).with_download(!self.no_download);
        if let Some(max_parallel) = self.max_parallel {
            options.max_parallel = usize::from(max_parallel);
        }
        if let Some(upstream) = self.upstream {
            options.upstream_url = upstream;
        }
        options.progress = ctx.progress;
        options.cancel = ctx.cancel.clone();

        let report = sync(&config, &ctx.root, &options).await?;

        println!(
            "{} {} ({} clusters, {} files updated)",
            "✓".green(),
            format!("Synchronized '{}'", config.name).bold(),
            report.clusters,
            report.files_written
        );
        match &report.vendored {
            Some(units) => {
                let files: usize = units.iter().map(|u| u.files).sum();
                println!("  Vendored {} packages ({files} files)", units.len());
                for unit in units {
                    tracing::info!("{} ({} files)", unit.dir, unit.files);
                }
            }
            None => println!("  {}", "Downloads skipped".yellow()),
        }
        Ok(())
    }
}
