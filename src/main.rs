//! tourbook - browse and book tours from the terminal.

use std::process::ExitCode;

use clap::Parser;

use tourbook::cli::{self, Cli};
use tourbook::config::Config;
use tourbook::logging::{self, LogOptions};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_options = Config::recover()
        .map(|config| LogOptions::from_settings(config.settings()))
        .unwrap_or_default();
    if let Err(e) = logging::init(&log_options) {
        eprintln!("warning: logging disabled: {}", e);
    }

    let result = cli::run(cli).await;
    tracing::info!("tourbook shutting down");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            eprintln!("Error: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("{}", action);
            }
            ExitCode::FAILURE
        }
    }
}
