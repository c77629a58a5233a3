//! KeyStore - client-local key/value storage
//!
//! A small string-to-string store with the same shape as a browser's
//! `localStorage`: items are read and written by key, every call can fail,
//! and callers decide whether a failure matters.
//!
//! # Backends
//!
//! - [`FileStorage`] - a JSON object on disk, shared between processes
//! - [`MemoryStorage`] - an in-process map
//! - [`UnavailableStorage`] - every call fails (storage disabled or blocked)
//!
//! # Example
//!
//! ```ignore
//! use keystore::{FileStorage, LocalStorage};
//!
//! let storage = FileStorage::open("storage.json")?;
//! storage.set_item("nps-widget-closed", "true")?;
//! assert_eq!(storage.get_item("nps-widget-closed")?, Some("true".to_string()));
//! ```

pub mod cli;
mod file;
mod memory;
mod storage;

pub use file::FileStorage;
pub use memory::{MemoryStorage, UnavailableStorage};
pub use storage::{LocalStorage, StorageError};

/// Default storage file name under the data directory
pub const DEFAULT_FILE_NAME: &str = "storage.json";

/// Default location for the storage file
pub fn default_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("npswidget")
        .join(DEFAULT_FILE_NAME)
}
