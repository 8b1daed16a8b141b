//! Platform-specific helpers.

/// Returns true when running on Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Name of the git executable for the current platform.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() { "git.exe" } else { "git" }
}

/// Converts a local path into a `file://` URL git accepts for shallow clones.
#[must_use]
pub fn file_url(path: &std::path::Path) -> String {
    let path_str = path.display().to_string().replace('\\', "/");
    if path_str.starts_with('/') {
        format!("file://{path_str}")
    } else {
        format!("file:///{path_str}")
    }
}
