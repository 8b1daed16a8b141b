//! Progress indicators for long-running vendoring.
//!
//! Bars are hidden when progress is disabled by flag, when
//! `KVENDOR_NO_PROGRESS` is set, or when stderr is not a terminal, so CI logs
//! stay clean.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

fn is_progress_disabled() -> bool {
    std::env::var_os("KVENDOR_NO_PROGRESS").is_some() || !std::io::stderr().is_terminal()
}

fn default_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸━")
}

/// Creates the bar shown while vendoring `len` package directories.
#[must_use]
pub fn vendoring_bar(len: u64, enabled: bool) -> ProgressBar {
    if !enabled || is_progress_disabled() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    bar.set_style(default_style());
    bar.set_prefix("Vendoring");
    bar
}
