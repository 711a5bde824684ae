//! Application settings configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// API base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// The OS keyring.
    #[default]
    Keyring,
    /// A plain file in the local data directory.
    File,
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the tour-booking API.
    pub api_url: String,
    /// Request timeout in seconds; `0` disables the timeout.
    pub timeout_secs: u64,
    /// Where the session token is kept.
    pub token_storage: TokenStorage,
    /// Log filter directives, used when `RUST_LOG` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    /// Directory for log files instead of the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 0,
            token_storage: TokenStorage::default(),
            log_filter: None,
            log_dir: None,
        }
    }
}

impl Settings {
    /// The request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Validate these settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` if the API URL is empty or
    /// lacks an http(s) scheme.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url cannot be empty".to_string(),
            ));
        }

        if !self.api_url.starts_with("https://") && !self.api_url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "api_url '{}' must start with http:// or https://",
                self.api_url
            )));
        }

        if matches!(&self.log_filter, Some(f) if f.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "log_filter cannot be empty; remove it to use the default".to_string(),
            ));
        }

        Ok(())
    }
}
