//! Unit test suite for kvendor
//!
//! Exercises resolution and ordering through the public API, without git
//! or network access.
//!
//! ```bash
//! cargo test --test unit
//! ```

#[path = "../common/mod.rs"]
mod common;

mod ordering;
mod resolution;
mod scenarios;
