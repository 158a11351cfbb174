//! Value types exchanged with callers and the identity provider.

use crate::error::{AuthError, AuthResult};
use crate::session_fsm::SessionState;
use serde::{Deserialize, Serialize};
use session_storage::{PersistedSession, User};

/// An authenticated identity plus its opaque access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self {
            user,
            token: token.into(),
        }
    }

    /// A non-empty user id and a non-empty token.
    pub fn is_complete(&self) -> bool {
        !self.user.id.trim().is_empty() && !self.token.trim().is_empty()
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        PersistedSession::new(session.user.clone(), session.token.clone())
    }
}

/// Which provider entry point a login identifier routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    Email,
    Username,
}

/// Login input. The identifier is an email address or a username.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Identifiers containing `@` are treated as email addresses.
    pub fn method(&self) -> LoginMethod {
        if self.identifier.contains('@') {
            LoginMethod::Email
        } else {
            LoginMethod::Username
        }
    }

    pub(crate) fn validate(&self) -> AuthResult<()> {
        if self.identifier.trim().is_empty() || self.password.is_empty() {
            return Err(AuthError::Validation(
                "Enter your username or email and password".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration input.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationData {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationData {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub(crate) fn validate(&self, min_password_len: usize) -> AuthResult<()> {
        if self.username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if self.username.contains('@') {
            return Err(AuthError::Validation(
                "Username cannot contain '@'".to_string(),
            ));
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => {
                return Err(AuthError::Validation(
                    "Enter a valid email address".to_string(),
                ))
            }
        }
        if self.password.chars().count() < min_password_len {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min_password_len} characters"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for RegistrationData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationData")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a UI needs to render the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub is_loading: bool,
    /// User-facing message from the last failed user action.
    pub error: Option<String>,
    /// Failed attempts so far in the current check cycle.
    pub retry_attempt: u8,
    pub(crate) check_epoch: u64,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user()
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token()
    }
}
