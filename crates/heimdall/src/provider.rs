//! Ports to the outside world: the identity provider and the modules that
//! hold per-user state.

use crate::error::AuthResult;
use crate::types::Session;
use async_trait::async_trait;
use session_storage::User;

/// Callback invoked by the provider whenever its notion of the session changes.
///
/// Providers may call it from any thread, including synchronously from inside
/// one of their own methods.
pub type SessionListener = Box<dyn Fn(Option<Session>) + Send + Sync>;

/// The external authority that verifies credentials and issues sessions.
///
/// The wire protocol is the implementor's concern; the coordinator only relies
/// on these operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with an email address.
    async fn login(&self, email: &str, password: &str) -> AuthResult<Session>;

    /// Sign in with a username.
    async fn login_with_username(&self, username: &str, password: &str) -> AuthResult<Session>;

    /// Create an account. Does not sign the new user in.
    async fn register(&self, username: &str, email: &str, password: &str) -> AuthResult<User>;

    /// End the provider-side session.
    async fn logout(&self) -> AuthResult<()>;

    /// The session the provider currently considers valid, if any.
    async fn get_session(&self) -> AuthResult<Option<Session>>;

    /// Register a change listener. Called once per process.
    fn on_change(&self, listener: SessionListener);
}

/// Application modules that keep per-user state (database handles, caches).
#[async_trait]
pub trait DownstreamModuleInitializer: Send + Sync {
    /// Prepare state for `user_id`. Called once per entry into `Authenticated`.
    async fn initialize_user_scope(&self, user_id: &str) -> AuthResult<()>;

    /// Release state for `user_id`. Must tolerate being called for a scope
    /// that was never initialized.
    async fn teardown_user_scope(&self, user_id: &str) -> AuthResult<()>;
}

/// Initializer for embedders without per-user modules.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInitializer;

#[async_trait]
impl DownstreamModuleInitializer for NoopInitializer {
    async fn initialize_user_scope(&self, _user_id: &str) -> AuthResult<()> {
        Ok(())
    }

    async fn teardown_user_scope(&self, _user_id: &str) -> AuthResult<()> {
        Ok(())
    }
}
