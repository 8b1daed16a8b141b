//! Core types shared by every kvendor component
//!
//! - [`error`] - the [`KvendorError`] taxonomy and user-facing [`ErrorContext`]
//! - [`cancel`] - the [`CancelToken`] used to abort a sync run promptly

pub mod cancel;
pub mod error;

pub use cancel::CancelToken;
pub use error::{ErrorContext, KvendorError, user_friendly_error};
