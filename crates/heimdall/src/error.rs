//! Authentication error types.

use thiserror::Error;

/// Message shown when a failure carries no user-actionable detail.
const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Message shown when the identity provider cannot be reached.
const UNREACHABLE_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wrong username/email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Registration rejected because the username or email is in use
    #[error("Username taken: {0}")]
    UsernameTaken(String),

    /// Input rejected locally before contacting the provider
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Network unavailable (transient error, can retry)
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// A provider call did not finish in time
    #[error("Operation timed out")]
    Timeout,

    /// Provider-side failure (5xx, malformed response, ...)
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// Session was invalidated server-side
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Missing async runtime or similar wiring problem
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] session_storage::StorageError),
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthError::NetworkUnavailable | AuthError::Timeout | AuthError::Provider(_)
        )
    }

    /// Returns true for errors caused by what the user typed.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials(_)
                | AuthError::UsernameTaken(_)
                | AuthError::Validation(_)
        )
    }

    /// Text suitable for the user-facing `error` field.
    ///
    /// Credential errors are shown verbatim. Everything else gets a generic
    /// sentence; the detailed text only goes to the logs.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(msg)
            | AuthError::UsernameTaken(msg)
            | AuthError::Validation(msg) => msg.clone(),
            AuthError::NetworkUnavailable | AuthError::Timeout => UNREACHABLE_MESSAGE.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(AuthError::NetworkUnavailable.is_transient());
        assert!(AuthError::Timeout.is_transient());
        assert!(AuthError::Provider("502".to_string()).is_transient());
    }

    #[test]
    fn test_is_not_transient() {
        assert!(!AuthError::InvalidCredentials("bad password".to_string()).is_transient());
        assert!(!AuthError::UsernameTaken("alice".to_string()).is_transient());
        assert!(!AuthError::Validation("short".to_string()).is_transient());
        assert!(!AuthError::SessionInvalid("revoked".to_string()).is_transient());
    }

    #[test]
    fn test_credential_errors_surface_verbatim() {
        let err = AuthError::InvalidCredentials("Invalid username or password".to_string());
        assert!(err.is_credential_error());
        assert_eq!(err.user_message(), "Invalid username or password");
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let err = AuthError::Provider("upstream 503: pool exhausted at db-3".to_string());
        assert!(!err.user_message().contains("db-3"));
        assert_eq!(AuthError::Timeout.user_message(), UNREACHABLE_MESSAGE);
        assert_eq!(
            AuthError::SessionInvalid("jwt expired".into()).user_message(),
            GENERIC_FAILURE_MESSAGE
        );
    }
}
