//! Token storage backend selection.

use anyhow::Result;
use clap::ValueEnum;
use smartio_admin_core::{Config, FileStore, KeyringStore, MemoryStore, SessionStore, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// JSON file in the local data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Process memory; forgotten on exit
    Memory,
}

pub enum Storage {
    File(FileStore),
    Keyring(KeyringStore),
    Memory(MemoryStore),
}

impl Storage {
    pub fn open(kind: StoreKind) -> Result<Self> {
        Ok(match kind {
            StoreKind::File => Storage::File(FileStore::new(Config::data_dir()?)),
            StoreKind::Keyring => Storage::Keyring(KeyringStore::new()),
            StoreKind::Memory => Storage::Memory(MemoryStore::new()),
        })
    }

    fn inner(&self) -> &dyn SessionStore {
        match self {
            Storage::File(store) => store,
            Storage::Keyring(store) => store,
            Storage::Memory(store) => store,
        }
    }

    /// One-line description of what is stored under `key`, without
    /// validating it.
    pub fn describe(&self, key: &str) -> Result<String> {
        if let Storage::File(store) = self {
            return Ok(match store.entry(key)? {
                Some(entry) => format!("Token stored {}", entry.age_display()),
                None => "No token stored".to_string(),
            });
        }
        Ok(match self.get(key)? {
            Some(_) => "Token stored".to_string(),
            None => "No token stored".to_string(),
        })
    }
}

impl SessionStore for Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner().get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner().set(key, value)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.inner().clear(key)
    }
}
