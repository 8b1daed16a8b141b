//! Error handling for kvendor
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`KvendorError`]) for every failure the core can
//!    report, so callers can match on the failure class.
//! 2. **User-friendly messages** ([`ErrorContext`]) with details and an actionable
//!    suggestion, produced by [`user_friendly_error`] for CLI output.
//!
//! # Error Categories
//!
//! - **Configuration**: [`KvendorError::ConfigParse`], [`KvendorError::ConfigInvalid`]
//! - **Resolution**: [`KvendorError::GroupNotFound`], [`KvendorError::ClusterNotFound`]
//! - **Fetch**: [`KvendorError::GitNotFound`], [`KvendorError::GitCloneFailed`],
//!   [`KvendorError::TagNotFound`], [`KvendorError::PackageNotFound`],
//!   [`KvendorError::GitCommandError`]
//! - **Filesystem**: [`KvendorError::FileSystemError`], [`KvendorError::UnsafePath`]
//! - **Collaborators**: [`KvendorError::RenderFailed`]
//! - **Control**: [`KvendorError::Cancelled`]
//!
//! Operations return [`anyhow::Result`] and wrap these errors with context
//! (package identity, cluster, path). Nothing is retried here; a caller that wants
//! retry on transient fetch failures wraps the fetcher itself.
//!
//! # Examples
//!
//! ```rust,no_run
//! use kvendor_cli::core::{KvendorError, user_friendly_error};
//!
//! let err = anyhow::Error::from(KvendorError::ClusterNotFound {
//!     group: "dev".to_string(),
//!     cluster: "dev-9".to_string(),
//! });
//! user_friendly_error(err).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for kvendor operations.
#[derive(Error, Debug, Clone)]
pub enum KvendorError {
    /// The configuration document could not be decoded.
    #[error("Failed to parse configuration {file}: {reason}")]
    ConfigParse {
        /// Path of the configuration document
        file: String,
        /// Decoder message
        reason: String,
    },

    /// The configuration decoded but does not follow the schema rules
    /// (bad type marker, malformed package key, duplicate identity, ...).
    #[error("Invalid configuration: {reason}")]
    ConfigInvalid {
        /// What is wrong with the document
        reason: String,
    },

    /// A group referenced by the caller is not declared in the configuration.
    #[error("Group '{group}' is not declared in the configuration")]
    GroupNotFound {
        /// Requested group name
        group: String,
    },

    /// A cluster referenced by the caller is not declared in its group.
    #[error("Cluster '{cluster}' is not declared in group '{group}'")]
    ClusterNotFound {
        /// Group that was searched
        group: String,
        /// Requested cluster name
        cluster: String,
    },

    /// The `git` executable is not available.
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// `git clone` failed (network, authentication, unknown repository).
    #[error("Failed to clone repository: {url}")]
    GitCloneFailed {
        /// Repository URL
        url: String,
        /// stderr of the git process
        reason: String,
    },

    /// Any other git invocation returned a non-zero status or timed out.
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// Git subcommand (e.g. "ls-tree", "cat-file")
        operation: String,
        /// stderr of the git process
        stderr: String,
    },

    /// The package tag does not exist upstream.
    #[error("Tag '{tag}' not found in {url}")]
    TagNotFound {
        /// Tag reference that was requested
        tag: String,
        /// Repository URL
        url: String,
    },

    /// The clone succeeded but the package subtree is absent at that version.
    #[error("{kind} '{name}' not found at version {version}")]
    PackageNotFound {
        /// Package kind ("module" or "addon")
        kind: String,
        /// Canonical package name (with flavor for modules)
        name: String,
        /// Pinned version
        version: String,
    },

    /// Filesystem operation failed on a specific path.
    #[error("File system error during {operation}: {path}")]
    FileSystemError {
        /// What was being done ("create directory", "write file", ...)
        operation: String,
        /// Offending path
        path: String,
    },

    /// A relative path from a fetched tree would escape its destination.
    #[error("Refusing to write outside the target directory: {path}")]
    UnsafePath {
        /// The rejected relative path
        path: String,
    },

    /// The manifest build collaborator failed.
    #[error("Render failed for {directory}: {reason}")]
    RenderFailed {
        /// Directory that was rendered
        directory: String,
        /// stderr or spawn failure
        reason: String,
    },

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Error wrapper carrying a suggestion and extra details for terminal output.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: KvendorError,
    /// Actionable next step for the user
    pub suggestion: Option<String>,
    /// Extra explanation of the failure
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: KvendorError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Converts any error into an [`ErrorContext`] suitable for the terminal.
///
/// The first [`KvendorError`] found in the chain decides the suggestion. The
/// outer context messages (which package, which cluster) become the details so
/// the user still sees where the failure happened.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain: Vec<String> = error.chain().map(ToString::to_string).collect();
    let location = if chain.len() > 1 {
        Some(chain[..chain.len() - 1].join("\n  "))
    } else {
        None
    };

    // downcast_ref also sees errors attached as context, which chain() does not.
    let typed = error
        .downcast_ref::<KvendorError>()
        .or_else(|| error.chain().find_map(|cause| cause.downcast_ref::<KvendorError>()))
        .cloned();

    if let Some(kv_error) = typed {
        let mut ctx = create_error_context(kv_error);
        if let Some(location) = location {
            ctx.details = Some(match ctx.details.take() {
                Some(details) => format!("{location}\n{details}"),
                None => location,
            });
        }
        return ctx;
    }

    if let Some(io_error) = error.chain().find_map(|c| c.downcast_ref::<std::io::Error>()) {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(KvendorError::FileSystemError {
                operation: "file access".to_string(),
                path: location.unwrap_or_else(|| "unknown".to_string()),
            })
            .with_suggestion("Check ownership and permissions of the destination directory");
        }
    }

    ErrorContext::new(KvendorError::ConfigInvalid {
        reason: chain.join(": "),
    })
}

fn create_error_context(error: KvendorError) -> ErrorContext {
    match &error {
        KvendorError::ConfigParse { .. } => ErrorContext::new(error)
            .with_suggestion("Check the YAML syntax and field names of the configuration document"),
        KvendorError::ConfigInvalid { .. } => ErrorContext::new(error).with_suggestion(
            "Module keys use '<name>/<flavor>', addon keys use '<name>'; identities must be unique",
        ),
        KvendorError::GroupNotFound { .. } | KvendorError::ClusterNotFound { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Run 'kvendor list' to see the declared groups and clusters")
        }
        KvendorError::GitNotFound => ErrorContext::new(error)
            .with_suggestion("Install git from https://git-scm.com/ and make sure it is in PATH"),
        KvendorError::GitCloneFailed { reason, .. } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_details(reason)
                .with_suggestion("Check network access and the configured upstream URL")
        }
        KvendorError::GitCommandError { stderr, .. } => {
            let stderr = stderr.clone();
            ErrorContext::new(error).with_details(stderr)
        }
        KvendorError::TagNotFound { .. } | KvendorError::PackageNotFound { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Verify the pinned version exists upstream for this package")
        }
        KvendorError::FileSystemError { .. } | KvendorError::UnsafePath { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Check permissions and free space under the destination root")
        }
        KvendorError::RenderFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'kvendor sync' first so every vendored path exists"),
        KvendorError::Cancelled => ErrorContext::new(error).with_details(
            "Resource lists already rewritten were kept; the vendors directory may be incomplete",
        ),
    }
}
