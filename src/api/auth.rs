//! Session token storage and bearer credentials.
//!
//! The session token is a single opaque string. It lives in a [`TokenStore`]:
//! the OS keyring by default, a plain file when no keyring is available, or
//! memory for tests and embedding.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, trace};

use super::error::{ApiError, Result};

/// The keyring service name for tourbook tokens.
const KEYRING_SERVICE: &str = "tourbook";

/// The fixed key the session token is stored under.
pub const TOKEN_KEY: &str = "session";

/// Persistent storage for the session token.
///
/// Implementations must be safe to share between the API client and the
/// session; every method takes `&self`.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Read the stored token, if any.
    fn load(&self) -> Result<Option<String>>;

    /// Persist a token, replacing any existing one.
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the stored token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;

    /// Check whether a token is present.
    fn has_token(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }
}

/// Build the bearer authorization header value for a token.
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Token storage in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
    key: String,
}

impl KeyringStore {
    /// Create a keyring store under the default service and key.
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            key: TOKEN_KEY.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.key)
            .map_err(|e| ApiError::Storage(format!("failed to access keyring: {}", e)))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringStore {
    fn load(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ApiError::Storage(format!("failed to retrieve token: {}", e))),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .map_err(|e| ApiError::Storage(format!("failed to store token: {}", e)))?;
        debug!("Stored session token in keyring");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!("Cleared session token from keyring");
                Ok(())
            }
            Err(e) => Err(ApiError::Storage(format!("failed to delete token: {}", e))),
        }
    }
}

/// Token storage in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a file store at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a file store in the platform data directory.
    ///
    /// - Linux: `~/.local/share/tourbook/session`
    /// - macOS: `~/Library/Application Support/tourbook/session`
    pub fn in_data_dir() -> Result<Self> {
        let dir = dirs::data_local_dir()
            .ok_or_else(|| ApiError::Storage("could not determine data directory".to_string()))?;
        Ok(Self::new(dir.join(KEYRING_SERVICE).join(TOKEN_KEY)))
    }

    /// The path the token is stored at.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TokenStore for FileStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApiError::Storage(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("failed to create directory: {}", e)))?;
        }
        write_private(&self.path, token).map_err(|e| {
            ApiError::Storage(format!("failed to write {}: {}", self.path.display(), e))
        })?;
        trace!("Wrote session token to {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Storage(format!(
                "failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Write `content` to `path`, readable by the owner only on Unix.
fn write_private(path: &Path, content: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path)?;
    // The mode only applies on creation.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    write_all(file, content)
}

fn write_all(mut file: fs::File, content: &str) -> io::Result<()> {
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

/// In-memory token storage.
#[derive(Default)]
pub struct MemoryStore {
    token: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a token.
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| ApiError::Storage("token store lock poisoned".to_string()))
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("has_token", &self.has_token())
            .finish()
    }
}

impl TokenStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}
