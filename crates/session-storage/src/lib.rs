//! Durable storage for the Vigor session coordinator.
//!
//! - [`SecureStorage`]: key/value backend trait
//! - [`FileStorage`]: JSON document on disk, written atomically
//! - [`MemoryStorage`]: in-process backend for tests and embedders
//! - [`SessionPersistence`]: reads and writes the single persisted session record

mod file;
mod keys;
mod memory;
mod session;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use session::{PersistedSession, SessionPersistence, User};
pub use traits::SecureStorage;

use session_config_and_utils::Paths;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Platform storage error: {0}")]
    Platform(String),

    /// Key not found
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default on-disk storage at `paths.session_store_file()`.
pub fn create_storage(paths: &Paths) -> StorageResult<Box<dyn SecureStorage>> {
    paths
        .ensure_dirs()
        .map_err(|e| StorageError::Platform(e.to_string()))?;
    let storage = FileStorage::open(paths.session_store_file())?;
    Ok(Box::new(storage))
}

/// Create a SessionPersistence with the default on-disk storage.
pub fn create_session_persistence(paths: &Paths) -> StorageResult<SessionPersistence> {
    let storage = create_storage(paths)?;
    Ok(SessionPersistence::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_session_persistence_on_disk() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("vigor"));

        let persistence = create_session_persistence(&paths).unwrap();
        persistence
            .save(&PersistedSession::new(User::new("u-1", "a@b.c", "Alice"), "tok"))
            .unwrap();

        assert!(paths.session_store_file().exists());

        let reopened = create_session_persistence(&paths).unwrap();
        let loaded = reopened.load().unwrap();
        assert_eq!(loaded.user.unwrap().id, "u-1");
        assert_eq!(loaded.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_storage_keys_unique() {
        let keys = StorageKeys::ALL;
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len(), "Storage keys must be unique");
        assert!(keys.iter().all(|k| !k.is_empty()));
    }
}
