use std::sync::{Arc, RwLock};

use quiz_core::model::{AuthenticatedUser, UserContext};

/// Process-wide record of who is logged in.
///
/// Populated at login, token replaced on refresh, cleared at logout. Clones
/// share the same slot.
#[derive(Clone, Default)]
pub struct AuthSessionStore {
    user: Arc<RwLock<Option<AuthenticatedUser>>>,
}

impl AuthSessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, user: AuthenticatedUser) {
        match self.user.write() {
            Ok(mut guard) => *guard = Some(user),
            Err(poisoned) => *poisoned.into_inner() = Some(user),
        }
    }

    /// Swap in a refreshed access token. Returns false when nobody is logged in.
    pub fn replace_token(&self, access_token: String) -> bool {
        let mut guard = match self.user.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_mut() {
            Some(user) => {
                user.access_token = access_token;
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        match self.user.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<AuthenticatedUser> {
        match self.user.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.current().map(|user| user.access_token)
    }

    #[must_use]
    pub fn context(&self) -> Option<UserContext> {
        self.current().map(|user| user.context())
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.current().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::UserId;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(12),
            first_name: "Sam".into(),
            last_name: "Lee".into(),
            email: "sam@example.com".into(),
            role: "User".into(),
            access_token: "t1".into(),
        }
    }

    #[test]
    fn lifecycle_login_refresh_logout() {
        let store = AuthSessionStore::new();
        assert!(!store.replace_token("early".into()));
        assert!(store.context().is_none());

        store.set(user());
        let shared = store.clone();
        assert_eq!(shared.access_token().as_deref(), Some("t1"));

        assert!(store.replace_token("t2".into()));
        assert_eq!(shared.access_token().as_deref(), Some("t2"));
        assert_eq!(shared.context().unwrap().user_id(), UserId::new(12));

        shared.clear();
        assert!(!store.is_logged_in());
    }
}
