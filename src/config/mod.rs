//! Configuration management for tourbook.
//!
//! Settings are read from `<config_dir>/tourbook/config.toml`. A missing file
//! means defaults. The `TOURBOOK_API_URL` environment variable overrides the
//! configured API URL.

mod settings;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

pub use settings::{Settings, TokenStorage, DEFAULT_API_URL};

/// Environment variable selecting the API base URL.
pub const API_URL_ENV: &str = "TOURBOOK_API_URL";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform configuration directory could not be determined.
    #[error("could not determine configuration directory")]
    NoConfigDir,

    /// The configuration directory could not be created.
    #[error("failed to create configuration directory: {0}")]
    CreateDirError(#[source] io::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    ReadError(#[source] io::Error),

    /// The configuration file could not be written.
    #[error("failed to write configuration file: {0}")]
    WriteError(#[source] io::Error),

    /// The configuration file is not valid TOML.
    #[error("failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The settings could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// The settings are invalid.
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Loaded configuration and where it came from.
///
/// Keeps the settings as stored in the file apart from the effective
/// settings, so an environment override is never written back by
/// [`Config::save`].
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    stored: Settings,
    api_url_override: Option<String>,
    effective: Settings,
}

impl Config {
    /// The default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("tourbook").join("config.toml"))
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load configuration from `path`, applying the environment override.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting settings are invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let stored = read_settings(path)?;
        let config = Self::new(path, stored);
        config.effective.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location for editing.
    ///
    /// See [`Config::recover_from`].
    pub fn recover() -> Result<Self> {
        Self::recover_from(&Self::default_path()?)
    }

    /// Load configuration from `path` without rejecting a broken file.
    ///
    /// An unparsable file yields defaults and invalid values are kept as
    /// they are, so the file can be repaired through [`Config::update`].
    /// Only a file that exists but cannot be read is an error.
    pub fn recover_from(path: &Path) -> Result<Self> {
        let stored = match read_settings(path) {
            Ok(settings) => settings,
            Err(ConfigError::ParseError(e)) => {
                warn!("Ignoring unparsable configuration {:?}: {}", path, e);
                Settings::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self::new(path, stored))
    }

    fn new(path: &Path, stored: Settings) -> Self {
        let api_url_override = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty());
        if api_url_override.is_some() {
            debug!("API URL overridden by {}", API_URL_ENV);
        }
        let mut config = Self {
            path: path.to_path_buf(),
            stored,
            api_url_override,
            effective: Settings::default(),
        };
        config.refresh();
        config
    }

    fn refresh(&mut self) {
        self.effective = self.stored.clone();
        if let Some(url) = &self.api_url_override {
            self.effective.api_url = url.clone();
        }
    }

    /// Save the stored settings back to the configuration file.
    pub fn save(&self) -> Result<()> {
        self.stored.validate()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let content = toml::to_string_pretty(&self.stored)?;
        fs::write(&self.path, content).map_err(ConfigError::WriteError)?;
        info!("Saved configuration to {:?}", self.path);
        Ok(())
    }

    /// The effective settings, with the environment override applied.
    pub fn settings(&self) -> &Settings {
        &self.effective
    }

    /// The settings as they are (or will be) stored in the file.
    pub fn stored(&self) -> &Settings {
        &self.stored
    }

    /// The API URL taken from the environment, if any.
    pub fn api_url_override(&self) -> Option<&str> {
        self.api_url_override.as_deref()
    }

    /// Edit the stored settings before [`Config::save`].
    pub fn update(&mut self, edit: impl FnOnce(&mut Settings)) {
        edit(&mut self.stored);
        self.refresh();
    }

    /// The configuration file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    match fs::read_to_string(path) {
        Ok(content) => {
            debug!("Loaded configuration from {:?}", path);
            Ok(toml::from_str(&content)?)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No configuration at {:?}, using defaults", path);
            Ok(Settings::default())
        }
        Err(e) => Err(ConfigError::ReadError(e)),
    }
}
