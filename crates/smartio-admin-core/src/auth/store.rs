//! Persisted key/value storage for the bearer token slot.
//!
//! The slot is keyed by `Config::storage_key`; at most one value lives under
//! it. Presence says nothing about validity, only the identity check does.

use std::collections::hash_map;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Keychain service name
const SERVICE_NAME: &str = "smartio-admin";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Remove `key`. Clearing an absent key succeeds.
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        (**self).clear(key)
    }
}

/// Process-local store; gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    pub stored_at: DateTime<Utc>,
}

impl StoredEntry {
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.stored_at).num_minutes()
    }

    /// Human readable age such as "5m ago" or "2d ago"
    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Durable store: one JSON file of entries in the data directory.
///
/// Every write rewrites the whole file. Two processes writing at once race
/// and the last writer wins.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn storage_path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredEntry>, StoreError> {
        let path = self.storage_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, StoredEntry>) -> Result<(), StoreError> {
        write_atomic(&self.storage_path(), &serde_json::to_string_pretty(entries)?)
    }

    /// Entries to rewrite. A corrupt file is discarded so the slot stays
    /// writable.
    fn read_for_write(&self) -> Result<BTreeMap<String, StoredEntry>, StoreError> {
        match self.read_all() {
            Err(StoreError::Corrupt(e)) => {
                warn!(error = %e, "Storage file is corrupt, starting over");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    /// Full entry including when it was written.
    pub fn entry(&self, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entry(key)?.map(|e| e.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_for_write()?;
        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                stored_at: Utc::now(),
            },
        );
        self.write_all(&entries)?;
        debug!(key, "Stored value");
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(StoreError::Corrupt(e)) => {
                // Nothing in the file is readable, so nothing can be kept.
                warn!(error = %e, "Storage file is corrupt, removing it");
                std::fs::remove_file(self.storage_path())?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
            debug!(key, "Cleared value");
        }
        Ok(())
    }
}

/// OS keychain store, one keychain entry per storage key.
///
/// Entries are created once per key and reused, so a credential backend
/// that keeps state per `Entry` sees every read and write for that key.
pub struct KeyringStore {
    service: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn using_entry<R>(
        &self,
        key: &str,
        f: impl FnOnce(&Entry) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let entry = match entries.entry(key.to_string()) {
            hash_map::Entry::Occupied(slot) => slot.into_mut(),
            hash_map::Entry::Vacant(slot) => slot.insert(Entry::new(&self.service, key)?),
        };
        f(entry)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.using_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.using_entry(key, |entry| Ok(entry.set_password(value)?))
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.using_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "admin_access_token";

    #[test]
    fn test_memory_store_get_set_clear() {
        let store = MemoryStore::new();
        assert_eq!(store.get(KEY).unwrap(), None);

        store.set(KEY, "first").unwrap();
        store.set(KEY, "second").unwrap();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("second"));

        store.clear(KEY).unwrap();
        assert_eq!(store.get(KEY).unwrap(), None);
        // Clearing again is fine
        store.clear(KEY).unwrap();
    }

    #[test]
    fn test_memory_store_keys_are_independent() {
        let store = MemoryStore::with_entry(KEY, "token");
        store.set("other", "x").unwrap();
        store.clear("other").unwrap();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("token"));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::new(dir.path().to_path_buf()).set(KEY, "abc").unwrap();

        let reopened = FileStore::new(dir.path().to_path_buf());
        assert_eq!(reopened.get(KEY).unwrap().as_deref(), Some("abc"));
        let entry = reopened.entry(KEY).unwrap().unwrap();
        assert!(entry.stored_at <= Utc::now());
    }

    #[test]
    fn test_stored_entry_age_display() {
        let mut entry = StoredEntry {
            value: "t".to_string(),
            stored_at: Utc::now(),
        };
        assert_eq!(entry.age_display(), "just now");

        entry.stored_at = Utc::now() - chrono::Duration::minutes(5);
        assert_eq!(entry.age_display(), "5m ago");

        entry.stored_at = Utc::now() - chrono::Duration::minutes(95);
        assert_eq!(entry.age_display(), "2h ago");

        entry.stored_at = Utc::now() - chrono::Duration::days(3);
        assert_eq!(entry.age_display(), "3d ago");

        entry.stored_at = Utc::now() + chrono::Duration::minutes(10);
        assert_eq!(entry.age_display(), "just now");
    }

    #[test]
    fn test_file_store_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        // Clearing before anything was written does not create the file
        store.clear(KEY).unwrap();
        assert!(!dir.path().join("nested").exists());

        store.set(KEY, "abc").unwrap();
        store.set("keep", "me").unwrap();
        store.clear(KEY).unwrap();
        assert_eq!(store.get(KEY).unwrap(), None);
        assert_eq!(store.get("keep").unwrap().as_deref(), Some("me"));
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_FILE), "not json").unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        assert!(matches!(store.get(KEY), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_file_store_set_over_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_FILE), "{truncated").unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        store.set(KEY, "fresh").unwrap();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_file_store_clear_over_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_FILE);
        std::fs::write(&path, "{truncated").unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        store.clear(KEY).unwrap();
        assert!(!path.exists());
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    fn mock_keyring() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
    }

    #[test]
    fn test_keyring_store_round_trip() {
        mock_keyring();
        let store = KeyringStore::with_service("smartio-admin-test");

        assert_eq!(store.get(KEY).unwrap(), None);
        store.set(KEY, "T").unwrap();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("T"));
        store.set(KEY, "T2").unwrap();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("T2"));

        store.clear(KEY).unwrap();
        assert_eq!(store.get(KEY).unwrap(), None);
        // Clearing an absent entry is fine
        store.clear(KEY).unwrap();
    }

    #[test]
    fn test_store_through_reference() {
        let store = MemoryStore::new();
        let by_ref = &store;
        by_ref.set(KEY, "t").unwrap();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("t"));
    }
}
