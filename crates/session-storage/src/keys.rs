//! Storage key constants.

/// Storage keys used by the application.
pub struct StorageKeys;

impl StorageKeys {
    /// The persisted session record (JSON `{ user, token }`).
    pub const SESSION: &'static str = "session";

    /// Prefix for other locally persisted application state
    /// (drafts, cached preferences). Wiped by a forced logout.
    pub const APP_STATE_PREFIX: &'static str = "app.";

    /// Every fixed key, for uniqueness checks.
    pub const ALL: [&'static str; 2] = [Self::SESSION, Self::APP_STATE_PREFIX];
}
