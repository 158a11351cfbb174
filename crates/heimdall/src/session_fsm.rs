//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐  BeginLogin / BeginCheck  ┌─────────────────┐
//! │ Unauthenticated │ ────────────────────────► │    Checking     │◄──┐
//! └─────────────────┘                           └────────┬────────┘   │
//!          ▲                                             │            │ Resume
//!          │ Clear                      Confirm          │ RetryPending
//!          │                     ┌───────────────────────┤ / Reject   │
//!          │                     ▼                       ▼            │
//!          │            ┌─────────────────┐     ┌─────────────────┐   │
//!          └─────────── │  Authenticated  │     │     Failed      │ ──┘
//!                       └─────────────────┘     └─────────────────┘
//! ```
//!
//! `Clear` is accepted from every state: logout, an empty provider answer,
//! retry exhaustion and the watchdog all land in `Unauthenticated`.

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use session_storage::User;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unauthenticated)

    Unauthenticated => {
        BeginLogin => Checking,
        BeginCheck => Checking,
        Confirm => Authenticated,
        Reject => Failed,
        Clear => Unauthenticated
    },
    Checking => {
        // A login may start while a background check is still running
        BeginLogin => Checking,
        Confirm => Authenticated,
        Reject => Failed,
        RetryPending => Failed,
        Clear => Unauthenticated
    },
    Authenticated => {
        BeginLogin => Checking,
        BeginCheck => Checking,
        Confirm => Authenticated,
        Reject => Failed,
        Clear => Unauthenticated
    },
    Failed => {
        BeginLogin => Checking,
        BeginCheck => Checking,
        Resume => Checking,
        Confirm => Authenticated,
        Reject => Failed,
        Clear => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// The coordinator's view of who is signed in.
///
/// `Unauthenticated` carries no fields, so a signed-out state can never hold
/// a stale user or token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    /// A check or login is in flight. `since_ms` is a Unix timestamp.
    Checking { since_ms: i64 },
    Authenticated { user: User, token: String },
    /// Terminal (`retryable == false`) or retry-pending failure.
    Failed {
        reason: String,
        retryable: bool,
        attempt: u8,
    },
}

impl SessionState {
    pub fn kind(&self) -> SessionStateKind {
        match self {
            SessionState::Unauthenticated => SessionStateKind::Unauthenticated,
            SessionState::Checking { .. } => SessionStateKind::Checking,
            SessionState::Authenticated { .. } => SessionStateKind::Authenticated,
            SessionState::Failed { .. } => SessionStateKind::Failed,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn is_checking(&self) -> bool {
        matches!(self, SessionState::Checking { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub(crate) fn checking_now() -> Self {
        SessionState::Checking {
            since_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Tag of a [`SessionState`], for events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStateKind {
    Unauthenticated,
    Checking,
    Authenticated,
    Failed,
}

impl From<&SessionMachineState> for SessionStateKind {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Unauthenticated => SessionStateKind::Unauthenticated,
            SessionMachineState::Checking => SessionStateKind::Checking,
            SessionMachineState::Authenticated => SessionStateKind::Authenticated,
            SessionMachineState::Failed => SessionStateKind::Failed,
        }
    }
}

/// Payload for session state change events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStateChangedPayload {
    pub state: SessionStateKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&SessionState> for SessionStateChangedPayload {
    fn from(state: &SessionState) -> Self {
        let user = state.user();
        Self {
            state: state.kind(),
            user_id: user.map(|u| u.id.clone()),
            email: user.map(|u| u.email.clone()),
        }
    }
}
