//! Storage trait and errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors from storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt storage file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// String key/value storage where every call may fail
///
/// Mirrors the browser `localStorage` surface. Implementations must be safe to
/// share between tasks.
pub trait LocalStorage: Send + Sync {
    /// Read an item, `None` if the key is absent
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write an item, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove an item; removing an absent key is not an error
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored, sorted
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Remove every item
    fn clear(&self) -> Result<(), StorageError>;
}
