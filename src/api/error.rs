//! API error types for the tour-booking client.

use thiserror::Error;

/// Message shown when the server gives no `detail` of its own.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Errors that can occur when talking to the tour-booking backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credentials or the session token.
    ///
    /// By the time a caller sees this, the stored token has already been
    /// cleared and the navigator sent to the login screen.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The user lacks access to the resource.
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other 4xx response (bad input, duplicate email, validation failure).
    #[error("Request rejected (HTTP {status}): {detail}")]
    Rejected {
        /// The HTTP status code.
        status: u16,
        /// The server-provided detail, or the generic fallback.
        detail: String,
    },

    /// Backend server error.
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Token storage could not be read or written.
    #[error("Token storage error: {0}")]
    Storage(String),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The operation needs a session and none is held. Nothing was sent.
    #[error("Not signed in")]
    NotSignedIn,

    /// Session validation failed.
    #[error("Connection validation failed: {0}")]
    ConnectionFailed(String),

    /// The request was abandoned because its scope was cancelled.
    #[error("Request cancelled")]
    Cancelled,
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code and the server `detail`, if any.
    pub fn from_status(status: reqwest::StatusCode, detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
        match status.as_u16() {
            401 => ApiError::Unauthorized(detail),
            403 => ApiError::Forbidden(detail),
            404 => ApiError::NotFound(detail),
            500..=599 => ApiError::ServerError(detail),
            code => ApiError::Rejected {
                status: code,
                detail,
            },
        }
    }

    /// The server-provided message carried by this error.
    ///
    /// Returns `None` for errors that never reached the server or were not
    /// produced from an HTTP response.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(d)
            | ApiError::Forbidden(d)
            | ApiError::NotFound(d)
            | ApiError::ServerError(d)
            | ApiError::Rejected { detail: d, .. } => Some(d),
            _ => None,
        }
    }

    /// The message to show in an inline alert: the server detail, or the
    /// generic fallback.
    pub fn display_message(&self) -> &str {
        self.detail().unwrap_or(GENERIC_ERROR_MESSAGE)
    }

    /// Whether this error forced the session to end.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

/// Extract the FastAPI-style `detail` from an error body.
///
/// `detail` is either a plain string or a list of validation errors, each
/// with a `msg` field.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join(", "))
            }
        }
        _ => None,
    }
}
