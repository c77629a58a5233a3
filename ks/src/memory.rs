//! In-process storage backends

use std::collections::BTreeMap;
use std::sync::Mutex;

use log::debug;

use crate::storage::{LocalStorage, StorageError};

/// Storage backed by an in-memory map
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-populated with the given items
    pub fn with_items<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: Mutex::new(items.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!("MemoryStorage::set_item: {}", key);
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.keys().cloned().collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.clear();
        Ok(())
    }
}

/// Storage that rejects every call
///
/// Stands in for disabled storage (private browsing, blocked cookies, a
/// read-only profile directory).
#[derive(Debug, Clone)]
pub struct UnavailableStorage {
    reason: String,
}

impl UnavailableStorage {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn fail<T>(&self) -> Result<T, StorageError> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }
}

impl Default for UnavailableStorage {
    fn default() -> Self {
        Self::new("storage disabled")
    }
}

impl LocalStorage for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        self.fail()
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        self.fail()
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        self.fail()
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.fail()
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.fail()
    }
}
