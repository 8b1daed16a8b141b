//! Type-safe Git command builder for consistent command execution
//!
//! Every git invocation in kvendor goes through [`GitCommand`]: it adds the
//! `-C <dir>` flag, applies a timeout, races the child against a
//! [`CancelToken`], kills the child when the future is dropped, and turns a
//! non-zero exit into a typed [`KvendorError`].

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::constants::GIT_LOCAL_TIMEOUT;
use crate::core::{CancelToken, KvendorError};
use crate::utils::platform::get_git_command;

/// Builder for one git process.
///
/// ```rust,ignore
/// use kvendor_cli::git::command_builder::GitCommand;
///
/// let out = GitCommand::new()
///     .args(["ls-tree", "-r", "-z", "HEAD"])
///     .current_dir("/tmp/clone.git")
///     .with_context("module m1")
///     .execute()
///     .await?;
/// ```
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
    stdin: Option<Vec<u8>>,
    timeout_duration: Option<Duration>,
    cancel: Option<CancelToken>,
    context: Option<String>,
    /// For clone commands, the URL and requested ref for error messages.
    clone_target: Option<(String, String)>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            // Never let git prompt on a terminal nobody is watching.
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            stdin: None,
            timeout_duration: Some(GIT_LOCAL_TIMEOUT),
            cancel: None,
            context: None,
            clone_target: None,
        }
    }
}

/// Captured output of a successful git command.
#[derive(Debug)]
pub struct GitCommandOutput {
    /// Raw stdout; blob contents are not necessarily UTF-8.
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl GitCommandOutput {
    #[must_use]
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }
}

impl GitCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Bytes written to the child's stdin (then closed).
    pub fn stdin(mut self, data: Vec<u8>) -> Self {
        self.stdin = Some(data);
        self
    }

    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    pub fn with_cancel(mut self, cancel: &CancelToken) -> Self {
        self.cancel = Some(cancel.clone());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn operation(&self) -> String {
        self.args.first().cloned().unwrap_or_else(|| "unknown".to_string())
    }

    pub async fn execute(self) -> Result<GitCommandOutput> {
        let start = std::time::Instant::now();
        let git_command = get_git_command();

        let mut full_args = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());

        let ctx = self.context.as_deref().unwrap_or("git");
        tracing::debug!(target: "git", "({}) Executing command: {} {}", ctx, git_command, redact(&full_args));

        let mut cmd = Command::new(git_command);
        cmd.args(&full_args)
            .stdin(if self.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KvendorError::GitNotFound.into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to spawn git {}", self.operation()));
            }
        };

        // Feed stdin concurrently so a large stdout cannot deadlock the pipe.
        let stdin_task = match (child.stdin.take(), self.stdin.clone()) {
            (Some(mut pipe), Some(data)) => Some(tokio::spawn(async move {
                let result = pipe.write_all(&data).await;
                drop(pipe);
                result
            })),
            _ => None,
        };

        let wait = child.wait_with_output();
        let cancel = self.cancel.clone().unwrap_or_default();
        let timed = async {
            match self.timeout_duration {
                Some(duration) => tokio::time::timeout(duration, wait).await.ok(),
                None => Some(wait.await),
            }
        };

        let output = tokio::select! {
            result = timed => result,
            () = cancel.cancelled() => {
                tracing::debug!(target: "git", "({}) git {} cancelled", ctx, self.operation());
                return Err(KvendorError::Cancelled.into());
            }
        };

        let output = match output {
            Some(result) => {
                result.with_context(|| format!("Failed to execute git {}", self.operation()))?
            }
            None => {
                let secs = self.timeout_duration.map_or(0, |d| d.as_secs());
                tracing::warn!(target: "git", "({}) git {} timed out after {}s", ctx, self.operation(), secs);
                return Err(KvendorError::GitCommandError {
                    operation: self.operation(),
                    stderr: format!("Git command timed out after {secs} seconds"),
                }
                .into());
            }
        };

        if let Some(task) = stdin_task {
            task.await
                .context("stdin writer task panicked")?
                .with_context(|| format!("Failed to write stdin of git {}", self.operation()))?;
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            tracing::debug!(
                target: "git",
                "({}) Command failed with exit code {:?}: {}",
                ctx,
                output.status.code(),
                stderr.trim()
            );
            return Err(self.failure(stderr).into());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(target: "git::perf", "({}) Git {} took {:.2}s", ctx, self.operation(), elapsed.as_secs_f64());
        } else {
            tracing::trace!(target: "git::perf", "({}) Git {} took {}ms", ctx, self.operation(), elapsed.as_millis());
        }

        Ok(GitCommandOutput {
            stdout: output.stdout,
            stderr,
        })
    }

    fn failure(&self, stderr: String) -> KvendorError {
        match &self.clone_target {
            Some((url, reference)) if is_missing_ref(&stderr) => KvendorError::TagNotFound {
                tag: reference.clone(),
                url: strip_auth_from_url(url),
            },
            Some((url, _)) => KvendorError::GitCloneFailed {
                url: strip_auth_from_url(url),
                reason: stderr,
            },
            None => KvendorError::GitCommandError {
                operation: self.operation(),
                stderr,
            },
        }
    }

    pub async fn execute_stdout(self) -> Result<String> {
        Ok(self.execute().await?.stdout_str())
    }

    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

// Convenience builders for the operations the fetcher needs

impl GitCommand {
    /// Shallow, single-ref, bare clone of `reference` (a branch or tag).
    pub fn shallow_clone(url: &str, reference: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new().args([
            "clone",
            "--bare",
            "--quiet",
            "--depth",
            "1",
            "--single-branch",
            "--branch",
            reference,
            url,
        ]);
        cmd.args.push(target.as_ref().display().to_string());
        cmd.clone_target = Some((url.to_string(), reference.to_string()));
        cmd
    }

    /// Recursive, NUL-separated listing of `tree_ish` restricted to `path`.
    pub fn ls_tree(tree_ish: &str, path: &str) -> Self {
        Self::new().args(["ls-tree", "-r", "-z", "--full-tree", tree_ish, "--", path])
    }

    /// Reads objects named on stdin, one per line.
    pub fn cat_file_batch() -> Self {
        Self::new().args(["cat-file", "--batch"])
    }

    pub fn version() -> Self {
        Self::new().arg("--version")
    }
}

fn is_missing_ref(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("not found in upstream")
        || lower.contains("couldn't find remote ref")
        || lower.contains("could not find remote branch")
}

/// Removes `user:token@` from HTTP(S) URLs so credentials never reach logs.
#[must_use]
pub fn strip_auth_from_url(url: &str) -> String {
    for scheme in ["https://", "http://"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            let host_end = rest.find('/').unwrap_or(rest.len());
            if let Some(at) = rest[..host_end].rfind('@') {
                return format!("{scheme}{}", &rest[at + 1..]);
            }
        }
    }
    url.to_string()
}

fn redact(args: &[String]) -> String {
    args.iter().map(|a| strip_auth_from_url(a)).collect::<Vec<_>>().join(" ")
}
