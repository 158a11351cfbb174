//! File-backed storage.
//!
//! The whole key/value map is one JSON document. Every mutation rewrites the
//! document through a temp file + fsync + rename, so a crash leaves either the
//! old or the new document on disk, never a torn one.

use crate::{SecureStorage, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// JSON document storage at a fixed path.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the document at `path`.
    ///
    /// An unreadable document is treated as empty and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        let data = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "Storage document is corrupt, starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(StorageError::Io(err)),
        };

        debug!(path = %path.display(), keys = data.len(), "Opened file storage");

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to the map and persist the result if it reports a change.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> (T, bool),
    ) -> StorageResult<T> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = data.clone();
        let (result, changed) = f(&mut next);
        if changed {
            let content = serde_json::to_string_pretty(&next)?;
            atomic_write(&self.path, &content)?;
            *data = next;
        }
        Ok(result)
    }
}

impl SecureStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.mutate(|data| {
            let previous = data.insert(key.to_string(), value.to_string());
            ((), previous.as_deref() != Some(value))
        })
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        Ok(data.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        self.mutate(|data| {
            let existed = data.remove(key).is_some();
            (existed, existed)
        })
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        Ok(data
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn clear_all(&self) -> StorageResult<usize> {
        self.mutate(|data| {
            let removed = data.len();
            data.clear();
            (removed, removed > 0)
        })
    }
}

fn atomic_write(path: &Path, content: &str) -> StorageResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StorageError::Platform(format!("No parent directory: {}", path.display())))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StorageError::Platform(format!("Invalid file name: {}", path.display())))?;

    fs::create_dir_all(dir)?;

    let tmp_path = dir.join(format!(
        ".{}.vigor.tmp.{}",
        file_name,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ));

    let write_result = (|| -> std::io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        // The document holds a bearer token; keep it owner-only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp_path, path)?;

        if let Ok(parent_dir) = fs::File::open(dir) {
            let _ = parent_dir.sync_all();
        }

        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(StorageError::Io(err));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("session", "{\"token\":\"t\"}").unwrap();
        storage.set("app.theme", "dark").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(
            reopened.get("session").unwrap().as_deref(),
            Some("{\"token\":\"t\"}")
        );
        assert_eq!(reopened.list_keys_with_prefix("app.").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty_and_not_created_on_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("session").unwrap(), None);
        assert!(!path.exists());

        storage.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_document_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.list_keys_with_prefix("").unwrap().is_empty());

        storage.set("k", "v").unwrap();
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_delete_and_clear_all() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let storage = FileStorage::open(&path).unwrap();

        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        assert!(storage.delete("a").unwrap());
        assert!(!storage.delete("a").unwrap());

        assert_eq!(storage.clear_all().unwrap(), 1);
        let reopened = FileStorage::open(&path).unwrap();
        assert!(reopened.list_keys_with_prefix("").unwrap().is_empty());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let storage = FileStorage::open(&path).unwrap();

        for i in 0..5 {
            storage.set("k", &i.to_string()).unwrap();
        }

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_document_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set("session", "secret").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
