//! The authenticated session.
//!
//! A [`Session`] is the one place that knows whether the user is signed in.
//! It is created once with [`Session::init`] and handed to whatever needs it;
//! clones share the same state.
//!
//! # Lifecycle
//!
//! 1. `init` reads the stored token. A present token counts as signed in;
//!    it is not checked with the server (see [`Session::validate`]).
//! 2. `login` / `register` store the issued token and flip the flag.
//! 3. `logout` forgets the token locally. No request is made.
//! 4. Any 401 from any endpoint clears the token and the flag, then the
//!    caller's navigator is sent to the login screen.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::api::auth::TokenStore;
use crate::api::client::ApiClient;
use crate::api::endpoints::{AuthApi, BookingsApi, RequestsApi, ToursApi};
use crate::api::error::{ApiError, Result};
use crate::api::navigator::{Navigator, LOGIN_PATH};
use crate::api::types::{AuthToken, RegisterData, User};

/// In-memory session flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Whether a session token is held.
    pub authenticated: bool,
    /// The signed-in user, once fetched.
    pub user: Option<User>,
}

/// Navigator wrapper that resets the session before a login redirect.
struct ExpiryNavigator {
    state: Arc<RwLock<SessionState>>,
    inner: Arc<dyn Navigator>,
}

impl Navigator for ExpiryNavigator {
    fn navigate(&self, path: &str) {
        if path == LOGIN_PATH {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = SessionState::default();
        }
        self.inner.navigate(path);
    }
}

/// The process-wide authentication context.
#[derive(Clone)]
pub struct Session {
    client: ApiClient,
    auth: AuthApi,
    tokens: Arc<dyn TokenStore>,
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    /// Start a session on top of `client`.
    ///
    /// The client's token store becomes the session's storage and its
    /// navigator keeps receiving login redirects. No network call is made.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    #[instrument(skip(client))]
    pub fn init(client: ApiClient) -> Result<Self> {
        let tokens = client.token_store();
        let authenticated = tokens.load()?.is_some();

        let state = Arc::new(RwLock::new(SessionState {
            authenticated,
            user: None,
        }));
        let inner = client.navigator();
        let client = client.with_navigator(Arc::new(ExpiryNavigator {
            state: Arc::clone(&state),
            inner,
        }));

        info!(authenticated, "Session initialized");
        Ok(Self {
            auth: AuthApi::new(client.clone()),
            client,
            tokens,
            state,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a session token is held.
    pub fn is_authenticated(&self) -> bool {
        self.read().authenticated
    }

    /// The signed-in user, if it has been fetched.
    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// A snapshot of the session flags.
    pub fn state(&self) -> SessionState {
        self.read().clone()
    }

    /// The client every session-aware call should go through.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// A view of this session whose requests stop when `scope` is cancelled.
    ///
    /// The view shares the token store and flags with `self`.
    pub fn scoped(&self, scope: &CancellationToken) -> Self {
        let client = self.client.scoped(scope);
        Self {
            auth: AuthApi::new(client.clone()),
            client,
            tokens: Arc::clone(&self.tokens),
            state: Arc::clone(&self.state),
        }
    }

    /// Tour endpoints bound to this session.
    pub fn tours(&self) -> ToursApi {
        ToursApi::new(self.client.clone())
    }

    /// Booking endpoints bound to this session.
    pub fn bookings(&self) -> BookingsApi {
        BookingsApi::new(self.client.clone())
    }

    /// Travel request endpoints bound to this session.
    pub fn requests(&self) -> RequestsApi {
        RequestsApi::new(self.client.clone())
    }

    /// Sign in with email and password.
    ///
    /// On failure the error is logged and returned; the session is left as
    /// it was.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let token = self.auth.login(email, password).await.map_err(|e| {
            error!("Login error: {}", e);
            e
        })?;
        self.establish(&token)?;
        info!("Signed in");
        Ok(())
    }

    /// Create an account and sign in with it.
    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn register(&self, data: &RegisterData) -> Result<()> {
        let token = self.auth.register(data).await.map_err(|e| {
            error!("Registration error: {}", e);
            e
        })?;
        self.establish(&token)?;
        info!("Registered and signed in");
        Ok(())
    }

    fn establish(&self, token: &AuthToken) -> Result<()> {
        self.tokens.save(&token.access_token)?;
        self.write().authenticated = true;
        Ok(())
    }

    /// Forget the session locally.
    ///
    /// The in-memory flags are reset even if the token store fails to clear;
    /// the storage error is still returned.
    pub fn logout(&self) -> Result<()> {
        *self.write() = SessionState::default();
        self.tokens.clear()?;
        info!("Signed out");
        Ok(())
    }

    /// Fetch the signed-in user's profile and remember it.
    #[instrument(skip(self))]
    pub async fn refresh_user(&self) -> Result<User> {
        let user = self.auth.profile().await?;
        debug!(username = %user.username, "Fetched profile");
        self.write().user = Some(user.clone());
        Ok(user)
    }

    /// Check the stored token with the backend.
    ///
    /// `init` trusts any stored token; call this to find out early whether
    /// it is still accepted. A rejected token ends the session exactly like
    /// any other 401.
    #[instrument(skip(self))]
    pub async fn validate(&self) -> Result<User> {
        if !self.is_authenticated() {
            return Err(ApiError::NotSignedIn);
        }

        self.refresh_user().await.map_err(|e| {
            error!("Session validation failed: {}", e);
            match e {
                ApiError::Unauthorized(_) | ApiError::NotSignedIn | ApiError::Cancelled => e,
                ApiError::Network(ref _err) => ApiError::ConnectionFailed(format!(
                    "Cannot connect to {}: {}",
                    self.client.base_url(),
                    e
                )),
                _ => ApiError::ConnectionFailed(e.to_string()),
            }
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("state", &self.state())
            .finish()
    }
}
