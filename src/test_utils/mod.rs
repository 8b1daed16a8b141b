//! Test utilities for kvendor
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suites.
//!
//! - [`init_test_logging`] - one-time tracing setup using the test writer
//! - [`TestGit`] / [`UpstreamFixture`] - local git upstreams with package tags

pub mod git_helper;

pub use git_helper::{TestGit, UpstreamFixture};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` given that level is used;
/// otherwise `RUST_LOG` is honored, and without it nothing is logged.
///
/// ```bash
/// RUST_LOG=git=debug,sync=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
