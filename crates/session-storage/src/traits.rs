//! Storage trait definitions.

use crate::StorageResult;

/// Trait for durable storage backends.
pub trait SecureStorage: Send + Sync {
    /// Store a value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value. Returns whether the key existed.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// List all keys that start with a given prefix.
    fn list_keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Delete every key. Returns how many were removed.
    fn clear_all(&self) -> StorageResult<usize> {
        let keys = self.list_keys_with_prefix("")?;
        let mut removed = 0;
        for key in keys {
            if self.delete(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Lets callers keep a handle on a backend they also hand to a consumer.
impl<T: SecureStorage + ?Sized> SecureStorage for std::sync::Arc<T> {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        (**self).delete(key)
    }

    fn has(&self, key: &str) -> StorageResult<bool> {
        (**self).has(key)
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        (**self).list_keys_with_prefix(prefix)
    }

    fn clear_all(&self) -> StorageResult<usize> {
        (**self).clear_all()
    }
}
