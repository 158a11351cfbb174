//! Structural checks on session state.

use crate::session_fsm::SessionState;
use session_storage::PersistedSession;

/// Rejects states that should be impossible.
///
/// `Unauthenticated` has no fields, so "signed out but still holding a user"
/// cannot be represented; what remains to check is that an authenticated
/// state is complete.
pub struct SessionIntegrityValidator;

impl SessionIntegrityValidator {
    pub fn validate(state: &SessionState) -> bool {
        match state {
            SessionState::Unauthenticated => true,
            SessionState::Checking { since_ms } => *since_ms >= 0,
            SessionState::Authenticated { user, token } => {
                !user.id.trim().is_empty() && !token.trim().is_empty()
            }
            SessionState::Failed {
                retryable, attempt, ..
            } => !*retryable || *attempt > 0,
        }
    }

    /// A restored record either holds a complete pair or nothing.
    pub fn validate_persisted(record: &PersistedSession) -> bool {
        record.is_consistent()
    }
}

/// Shorthand for [`SessionIntegrityValidator::validate`].
pub fn validate(state: &SessionState) -> bool {
    SessionIntegrityValidator::validate(state)
}
