//! kvendor CLI entry point
//!
//! Parses arguments, installs logging and a Ctrl-C handler, runs the command
//! and turns failures into a user-friendly message with exit code 1.

use anyhow::Result;
use clap::Parser;
use kvendor_cli::cli;
use kvendor_cli::core::{CancelToken, user_friendly_error};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.init_logging();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cancel = CancelToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling");
                cancel.cancel();
            }
        }
    });

    match cli.execute(cancel).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
