//! File logging for the command-line client.
//!
//! Everything goes to a daily-rotated file so log lines never mix with
//! command output. The filter comes from `RUST_LOG` when set, then from the
//! `log_filter` setting, then [`DEFAULT_LOG_FILTER`].

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::config::Settings;

/// Filter used when neither `RUST_LOG` nor the settings name one.
pub const DEFAULT_LOG_FILTER: &str = "tourbook=info,warn";

const LOG_FILE_PREFIX: &str = "tourbook.log";

/// Where and how much to log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Filter directives; `None` means [`DEFAULT_LOG_FILTER`].
    pub filter: Option<String>,
    /// Log directory; `None` means the platform default.
    pub directory: Option<PathBuf>,
}

impl LogOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            filter: settings.log_filter.clone(),
            directory: settings.log_dir.clone(),
        }
    }

    /// The directory log files are written to.
    ///
    /// - Linux: `~/.local/share/tourbook/logs/`
    /// - macOS: `~/Library/Application Support/tourbook/logs/`
    /// - Windows: `C:\Users\<User>\AppData\Local\tourbook\logs\`
    pub fn log_directory(&self) -> anyhow::Result<PathBuf> {
        match &self.directory {
            Some(dir) => Ok(dir.clone()),
            None => default_log_directory(),
        }
    }

    /// The filter directives in effect, given the value of `RUST_LOG`.
    fn directives(&self, env: Option<String>) -> String {
        env.filter(|v| !v.trim().is_empty())
            .or_else(|| self.filter.clone())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        let directives = self.directives(std::env::var(EnvFilter::DEFAULT_ENV).ok());
        EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid log filter '{}'", directives))
    }
}

/// Install the global subscriber.
///
/// Returns the directory logs are written to.
///
/// # Errors
///
/// Returns an error if the log directory cannot be determined or created,
/// if the filter does not parse, or if a global subscriber is already set.
pub fn init(options: &LogOptions) -> anyhow::Result<PathBuf> {
    let log_dir = options.log_directory()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let filter = options.env_filter()?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), log_dir = %log_dir.display(), "Logging started");
    Ok(log_dir)
}

fn default_log_directory() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir().context("could not determine local data directory")?;
    Ok(base.join("tourbook").join("logs"))
}
