//! Tour-booking API client implementation.
//!
//! This module provides the single configured HTTP client every endpoint goes
//! through. It owns the two cross-cutting request policies:
//! - outbound: attach the stored session token as a bearer credential
//! - inbound: on HTTP 401, clear the stored token and navigate to the login
//!   screen before the error reaches the caller
//!
//! There is no retry logic. Failures surface directly to callers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use super::auth::{bearer_header, TokenStore};
use super::error::{extract_detail, ApiError, Result};
use super::navigator::{Navigator, NoopNavigator, LOGIN_PATH};
use crate::config::Settings;

/// The tour-booking API client.
///
/// Cloning is cheap: clones share the connection pool, the token store and
/// the navigator.
#[derive(Clone)]
pub struct ApiClient {
    /// The HTTP client.
    client: Client,
    /// The API base URL, without a trailing slash.
    base_url: String,
    /// Where the session token lives.
    tokens: Arc<dyn TokenStore>,
    /// Receives the redirect to the login screen on 401.
    navigator: Arc<dyn Navigator>,
    /// Cancels in-flight requests when the owning scope ends.
    cancel: Option<CancellationToken>,
}

impl ApiClient {
    /// Create a client for `base_url` with no request timeout.
    ///
    /// The client starts with a navigator that ignores redirects; use
    /// [`ApiClient::with_navigator`] to observe them.
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        Self::with_timeout(base_url, tokens, None)
    }

    /// Create a client from application settings.
    pub fn from_settings(settings: &Settings, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        Self::with_timeout(&settings.api_url, tokens, settings.timeout())
    }

    fn with_timeout(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let client = Self::build_http_client(timeout)?;

        debug!(base_url = %base_url, "Created API client");
        Ok(Self {
            client,
            base_url,
            tokens,
            navigator: Arc::new(NoopNavigator),
            cancel: None,
        })
    }

    /// Build the HTTP client with JSON defaults.
    fn build_http_client(timeout: Option<Duration>) -> Result<Client> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(ApiError::Network)
    }

    /// Replace the navigator that receives the login redirect.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Derive a client whose requests are aborted when `scope` is cancelled.
    ///
    /// Requests still in flight at that point fail with [`ApiError::Cancelled`].
    pub fn scoped(&self, scope: &CancellationToken) -> Self {
        let mut client = self.clone();
        client.cancel = Some(scope.clone());
        client
    }

    /// The current navigator.
    pub fn navigator(&self) -> Arc<dyn Navigator> {
        Arc::clone(&self.navigator)
    }

    /// The token store shared with the session.
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.tokens)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Perform a GET request.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.url(path));
        self.execute(request).await
    }

    /// Perform a GET request with query parameters.
    #[instrument(skip(self, query))]
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.client.get(self.url(path)).query(query);
        self.execute(request).await
    }

    /// Perform a POST request with a JSON body.
    #[instrument(skip(self, body))]
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.client.post(self.url(path)).json(body);
        self.execute(request).await
    }

    /// Perform a POST request with no body.
    #[instrument(skip(self))]
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.post(self.url(path));
        self.execute(request).await
    }

    /// Run a request through both interceptors, honouring cancellation.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = self.authorize(request)?;

        let exchange = async move {
            let response = request.send().await?;
            self.handle_response(response).await
        };

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Request cancelled by scope");
                        Err(ApiError::Cancelled)
                    }
                    result = exchange => result,
                }
            }
            None => exchange.await,
        }
    }

    /// Outbound interceptor: attach the bearer token if one is stored.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self.tokens.load()? {
            Some(token) => Ok(request.header(header::AUTHORIZATION, bearer_header(&token))),
            None => Ok(request),
        }
    }

    /// Inbound interceptor: check for errors and parse JSON.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)));
        }

        let url = response.url().path().to_string();
        let error_body = response.text().await.unwrap_or_default();
        debug!(status = %status, url = %url, "Error response body: {}", error_body);

        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
        }

        Err(ApiError::from_status(status, extract_detail(&error_body)))
    }

    /// Drop the stored token and send the user to the login screen.
    fn expire_session(&self) {
        warn!("Server rejected the session token, signing out");
        if let Err(e) = self.tokens.clear() {
            error!("Failed to clear session token: {}", e);
        }
        self.navigator.navigate(LOGIN_PATH);
    }
}

/// Owns a cancellation token for the requests of one consumer.
///
/// Clients derived through [`RequestScope::client`] abort their in-flight
/// requests when the scope is cancelled or dropped.
#[derive(Debug, Default)]
pub struct RequestScope {
    token: CancellationToken,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a client bound to this scope.
    pub fn client(&self, client: &ApiClient) -> ApiClient {
        client.scoped(&self.token)
    }

    /// The underlying token, for binding sessions or cancelling from elsewhere.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Abort every request made through this scope.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens)
            .field("scoped", &self.cancel.is_some())
            .finish()
    }
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ApiError::InvalidUrl(format!(
            "'{}' must start with http:// or https://",
            url
        )));
    }

    // Warn if not HTTPS (but don't enforce for local development)
    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1")
    {
        warn!("URL does not use HTTPS: {}. Tokens will be sent in clear text.", url);
    }

    Ok(url.to_string())
}
