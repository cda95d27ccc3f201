//! REST adapter: bearer-authenticated JSON over reqwest.

mod auth;
mod catalog;
mod completions;
mod config;
mod progress;
mod wire;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth_store::AuthSessionStore;
use crate::repository::BackendError;

pub use config::{ApiConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

/// Client for the wellness REST backend.
///
/// Implements every collaborator trait; the access token is read from the
/// shared `AuthSessionStore` on each request.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: ApiConfig,
    session: AuthSessionStore,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the underlying client cannot be built.
    pub fn new(config: &ApiConfig, session: AuthSessionStore) -> Result<Self, BackendError> {
        // The refresh token travels as an httpOnly cookie set by /auth/login.
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
            session,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, BackendError> {
        let url = self.config.endpoint(path)?;
        debug!(%method, %url, "backend request");
        Ok(self.client.request(method, url))
    }

    /// Same as `request`, but refuses to go out without a logged-in user.
    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, BackendError> {
        let token = self
            .session
            .access_token()
            .ok_or(BackendError::Unauthenticated)?;
        Ok(self.request(method, path)?.bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        match status {
            s if s.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(%status, url = %response.url(), "backend rejected credentials");
                Err(BackendError::Unauthenticated)
            }
            _ => {
                warn!(%status, url = %response.url(), "backend request failed");
                Err(BackendError::HttpStatus(status))
            }
        }
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}
