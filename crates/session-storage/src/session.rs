//! The persisted session record.

use crate::{SecureStorage, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An authenticated identity as reported by the identity provider.
///
/// Immutable value: a changed profile replaces the whole `User`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// The only session fields written to durable storage.
///
/// There is intentionally no "authenticated" flag: a restored process must
/// re-validate these credentials before trusting them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
}

impl PersistedSession {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            token: Some(token.into()),
        }
    }

    /// Neither a user nor a token.
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.token.is_none()
    }

    /// A user is present exactly when a non-empty token is, and a present
    /// user has a non-empty id.
    pub fn is_consistent(&self) -> bool {
        match (&self.user, &self.token) {
            (None, None) => true,
            (Some(user), Some(token)) => !user.id.is_empty() && !token.is_empty(),
            _ => false,
        }
    }
}

/// Reads and writes the persisted session under [`StorageKeys::SESSION`].
pub struct SessionPersistence {
    storage: Box<dyn SecureStorage>,
}

impl SessionPersistence {
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Load the persisted session. Missing or unreadable records load as empty;
    /// unreadable ones are also removed.
    pub fn load(&self) -> StorageResult<PersistedSession> {
        let Some(raw) = self.storage.get(StorageKeys::SESSION)? else {
            return Ok(PersistedSession::default());
        };

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(session) => {
                debug!(
                    has_user = session.user.is_some(),
                    has_token = session.token.is_some(),
                    "Loaded persisted session"
                );
                Ok(session)
            }
            Err(err) => {
                warn!(error = %err, "Persisted session is unreadable, discarding it");
                self.storage.delete(StorageKeys::SESSION)?;
                Ok(PersistedSession::default())
            }
        }
    }

    /// Overwrite the persisted session. An empty record clears the key.
    pub fn save(&self, session: &PersistedSession) -> StorageResult<()> {
        if session.is_empty() {
            return self.clear();
        }
        let json = serde_json::to_string(session)?;
        self.storage.set(StorageKeys::SESSION, &json)
    }

    /// Remove the persisted session.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::SESSION)?;
        Ok(())
    }

    /// Remove the session and every other locally persisted key.
    pub fn clear_all(&self) -> StorageResult<()> {
        let app_state = self
            .storage
            .list_keys_with_prefix(StorageKeys::APP_STATE_PREFIX)?
            .len();
        let removed = self.storage.clear_all()?;
        debug!(removed, app_state, "Cleared all local application state");
        Ok(())
    }
}
