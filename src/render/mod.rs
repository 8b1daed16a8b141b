//! The manifest build collaborator.
//!
//! kvendor does not interpret manifests. Rendering a cluster directory is
//! delegated to an external build tool (`kustomize build` by default) and its
//! output is passed through as opaque bytes.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::core::KvendorError;

/// Renders a directory into manifest bytes.
pub trait Renderer {
    fn render(&self, directory: &Path) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Runs a configured command with the directory appended as last argument.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    /// Builds a renderer from `["program", "arg", ...]`.
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| KvendorError::ConfigInvalid {
            reason: "render_command is empty".to_string(),
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn resolve_program(&self, directory: &Path) -> Result<PathBuf, KvendorError> {
        which::which(&self.program).map_err(|e| KvendorError::RenderFailed {
            directory: directory.display().to_string(),
            reason: format!("'{}' not found in PATH: {e}", self.program),
        })
    }
}

impl Renderer for CommandRenderer {
    async fn render(&self, directory: &Path) -> Result<Vec<u8>> {
        let program = self.resolve_program(directory)?;
        tracing::debug!("Rendering {} with {} {:?}", directory.display(), program.display(), self.args);

        let output = Command::new(&program)
            .args(&self.args)
            .arg(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", program.display()))?;

        if !output.status.success() {
            return Err(KvendorError::RenderFailed {
                directory: directory.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(output.stdout)
    }
}
