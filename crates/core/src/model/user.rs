use std::fmt;

use crate::model::UserId;

/// The logged-in user as returned by the auth endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub access_token: String,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn context(&self) -> UserContext {
        UserContext::new(self.id)
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

impl fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Who is taking a quiz. Handed to the quiz controller at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserContext {
    user_id: UserId,
}

impl UserContext {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
