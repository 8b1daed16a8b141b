//! Cross-platform utilities
//!
//! - [`fs`] - directory creation, atomic writes and removal with path context
//! - [`path_validation`] - rejection of tree paths that escape their target
//! - [`platform`] - git executable lookup and `file://` URLs
//! - [`progress`] - progress bars for vendoring

pub mod fs;
pub mod path_validation;
pub mod platform;
pub mod progress;

pub use fs::{atomic_write, ensure_dir, ensure_parent_dir, read_optional_text, remove_dir_all};
pub use path_validation::safe_relative_path;
pub use platform::{file_url, get_git_command, is_windows};
