//! File-backed storage
//!
//! The whole store is one JSON object (`{"key": "value", ...}`). Every
//! mutation takes an exclusive lock on a sidecar `.lock` file, re-reads the
//! object, applies the change and replaces the file via temp file + rename, so
//! concurrent processes never observe a half-written store.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, info};

use crate::storage::{LocalStorage, StorageError};

type Items = BTreeMap<String, String>;

/// Storage persisted as a JSON object on disk
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Open storage at the given file path, creating parent directories
    ///
    /// The file itself is created lazily on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        debug!("FileStorage::open: {}", path.display());
        Ok(Self { path })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock(&self) -> Result<File, StorageError> {
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StorageError::io(&lock_path, e))?;
        file.lock_exclusive().map_err(|e| StorageError::io(&lock_path, e))?;
        Ok(file)
    }

    fn read(&self) -> Result<Items, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Items::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Items::new()),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }

    fn write(&self, items: &Items) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(items).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, content).map_err(|e| StorageError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))?;
        Ok(())
    }

    /// Apply a mutation under the exclusive lock
    fn update(&self, apply: impl FnOnce(&mut Items)) -> Result<(), StorageError> {
        let lock = self.lock()?;
        let mut items = self.read()?;
        apply(&mut items);
        let result = self.write(&items);
        // Closing the handle releases the lock; unlock explicitly so errors surface in logs
        if let Err(e) = lock.unlock() {
            debug!("FileStorage::update: unlock failed: {}", e);
        }
        result
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!("FileStorage::set_item: {}", key);
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        debug!("FileStorage::remove_item: {}", key);
        self.update(|items| {
            items.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read()?.into_keys().collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.update(|items| items.clear())?;
        info!("Cleared storage at {}", self.path.display());
        Ok(())
    }
}
