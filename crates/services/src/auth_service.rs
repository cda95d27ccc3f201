use std::sync::Arc;

use backend::{AuthGateway, AuthSessionStore};
use quiz_core::model::{AuthenticatedUser, UserContext};
use tracing::{info, warn};

use crate::error::AuthError;

/// Login/refresh/logout bookkeeping over the shared session store.
#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    store: AuthSessionStore,
}

impl AuthService {
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthGateway>, store: AuthSessionStore) -> Self {
        Self { gateway, store }
    }

    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` for blank input, or the backend error.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserContext, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let user = self.gateway.login(email, password).await?;
        let context = user.context();
        info!(user_id = %user.id, "logged in");
        self.store.set(user);
        Ok(context)
    }

    /// Replace the stored access token with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` without a session, or the backend error.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        if !self.store.is_logged_in() {
            return Err(AuthError::NotLoggedIn);
        }
        let token = self.gateway.refresh().await?;
        if !self.store.replace_token(token) {
            // logged out while the refresh was in flight
            return Err(AuthError::NotLoggedIn);
        }
        Ok(())
    }

    /// Clear the local session. The remote logout is best-effort.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` if nobody was logged in.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let user = self.store.current().ok_or(AuthError::NotLoggedIn)?;
        if let Err(e) = self.gateway.logout(user.id).await {
            warn!(user_id = %user.id, error = %e, "remote logout failed; clearing local session anyway");
        }
        self.store.clear();
        info!(user_id = %user.id, "logged out");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` without a session.
    pub fn context(&self) -> Result<UserContext, AuthError> {
        self.store.context().ok_or(AuthError::NotLoggedIn)
    }

    #[must_use]
    pub fn current_user(&self) -> Option<AuthenticatedUser> {
        self.store.current()
    }
}
