//! In-memory storage backend.

use crate::{SecureStorage, StorageResult};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Process-local storage. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_data<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> T {
        let mut guard = self.data.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl SecureStorage for MemoryStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.with_data(|data| data.insert(key.to_string(), value.to_string()));
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.with_data(|data| data.get(key).cloned()))
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        Ok(self.with_data(|data| data.remove(key).is_some()))
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self.with_data(|data| {
            data.keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect()
        }))
    }
}
