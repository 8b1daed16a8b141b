//! Cooperative cancellation for long-running synchronization.
//!
//! A [`CancelToken`] is cheap to clone and shared by every task of one sync run.
//! Git commands race against [`CancelToken::cancelled`] and kill their child
//! process when it fires; file writers poll [`CancelToken::is_cancelled`]
//! between files.

use std::sync::Arc;
use tokio::sync::watch;

use super::KvendorError;

/// Shared cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Signals cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Returns `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), KvendorError> {
        if self.is_cancelled() { Err(KvendorError::Cancelled) } else { Ok(()) }
    }

    /// Resolves when cancellation is requested.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so wait_for only returns on `true`.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}
