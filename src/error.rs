//! Centralized error types for tourbook.
//!
//! This module provides a unified error hierarchy for the application with
//! user-friendly error messages. All error types use `thiserror` for
//! ergonomic error handling.

use thiserror::Error;

use crate::api::error::{ApiError, GENERIC_ERROR_MESSAGE};
use crate::config::ConfigError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// IO errors (file system, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input given on the command line.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Create an invalid-input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AppError::InvalidInput(msg.into())
    }

    /// Get a user-friendly message for an inline alert.
    ///
    /// HTTP failures show the server's `detail` when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) | ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check it is readable.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
            },
            AppError::Api(e) => match e {
                ApiError::Network(_) => {
                    "Connection failed. Please check your internet connection.".to_string()
                }
                ApiError::ConnectionFailed(_) => {
                    "Could not reach the tour service. Please check the API URL.".to_string()
                }
                ApiError::InvalidUrl(_) => "Invalid API URL in configuration.".to_string(),
                ApiError::Storage(_) => {
                    "Could not access the saved session. Please sign in again.".to_string()
                }
                ApiError::Cancelled => "Request cancelled.".to_string(),
                ApiError::NotSignedIn => "You are not signed in.".to_string(),
                ApiError::InvalidResponse(_) => GENERIC_ERROR_MESSAGE.to_string(),
                other => other.display_message().to_string(),
            },
            AppError::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
        }
    }

    /// Whether the error ended the session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, AppError::Api(ApiError::Unauthorized(_)))
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::ParseError(_))
            | AppError::Config(ConfigError::ValidationError(_)) => {
                Some("Fix the file shown by 'tourbook config show' or set TOURBOOK_API_URL.")
            }
            AppError::Api(ApiError::Unauthorized(_)) | AppError::Api(ApiError::NotSignedIn) => {
                Some("Run 'tourbook login' to sign in.")
            }
            AppError::Api(ApiError::Network(_)) | AppError::Api(ApiError::ConnectionFailed(_)) => {
                Some("Check your connection and the configured API URL.")
            }
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
