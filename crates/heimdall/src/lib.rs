//! Heimdall: the client-side session coordinator.
//!
//! Owns the single authoritative record of who is signed in and keeps it
//! consistent with an external [`IdentityProvider`] under concurrent and
//! repeated triggers.
//!
//! - [`SessionStore`]: login, registration, logout and debounced session checks
//! - [`ProviderEventBridge`]: applies provider-originated changes without feedback loops
//! - [`CheckWatchdog`]: resets a check that never resolves
//! - [`RetryPolicy`]: bounded exponential backoff
//! - [`SessionIntegrityValidator`]: structural checks on the state

mod bridge;
mod debounce;
mod error;
mod provider;
mod retry;
mod session_fsm;
mod store;
mod types;
mod validator;
mod watchdog;

#[cfg(test)]
mod tests;

pub use bridge::{BridgeStats, ProviderEventBridge, Reconciliation};
pub use debounce::{CheckPhase, DebounceGuard, Suppressed};
pub use error::{AuthError, AuthResult};
pub use provider::{
    DownstreamModuleInitializer, IdentityProvider, NoopInitializer, SessionListener,
};
pub use retry::{with_retry, RetryContext, RetryPolicy};
pub use session_fsm::{
    SessionMachine, SessionMachineInput, SessionMachineState, SessionState,
    SessionStateChangedPayload, SessionStateKind,
};
pub use store::{
    SessionStateCallback, SessionStore, SessionStoreBuilder, StoreConfig, WeakSessionStore,
};
pub use types::{Credentials, LoginMethod, RegistrationData, Session, SessionSnapshot};
pub use validator::{validate, SessionIntegrityValidator};
pub use watchdog::CheckWatchdog;

pub use session_storage::{PersistedSession, SessionPersistence, User};
