//! Integration test suite for kvendor
//!
//! End-to-end tests against real git repositories served through `file://`
//! URLs. They need a `git` binary but no network.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **fetch**: tag clones, subtree filtering and fetch errors
//! - **sync**: full synchronization with and without downloads
//! - **cli**: the `kvendor` binary

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod fetch;
mod sync;
