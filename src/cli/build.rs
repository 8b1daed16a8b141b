//! `kvendor build`: render one cluster with the configured build tool.

use anyhow::{Context, Result};
use clap::Args;
use std::io::Write;

use super::CommandContext;
use crate::render::{CommandRenderer, Renderer};
use crate::sync::Layout;

#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Group of the cluster
    group: String,

    /// Cluster to render
    cluster: String,
}

impl BuildCommand {
    pub async fn execute(self, ctx: CommandContext) -> Result<()> {
        let config = ctx.load_config()?;
        config.cluster(&self.group, &self.cluster)?;

        let directory = Layout::new(&ctx.root).cluster_dir(&self.group, &self.cluster);
        let renderer = CommandRenderer::new(&ctx.settings.render_command)?;
        let rendered = renderer.render(&directory).await?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&rendered).context("Failed to write rendered manifests")?;
        stdout.flush().context("Failed to write rendered manifests")?;
        Ok(())
    }
}
