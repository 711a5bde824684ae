//! Navigation side effects triggered by the API client.

use std::fmt;
use std::sync::Mutex;

/// Path of the login screen.
pub const LOGIN_PATH: &str = "/login";

/// Receives navigation requests from the API client.
///
/// The client navigates to [`LOGIN_PATH`] whenever the backend answers 401.
/// A GUI would switch screens here; the terminal front end prints a prompt.
pub trait Navigator: Send + Sync {
    /// Navigate to the given application path.
    fn navigate(&self, path: &str);
}

/// A navigator that ignores every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _path: &str) {}
}

/// A navigator that remembers every path it was sent to.
#[derive(Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths visited so far, oldest first.
    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl fmt::Debug for RecordingNavigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingNavigator")
            .field("visited", &self.visited())
            .finish()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(path.to_string());
        }
    }
}
