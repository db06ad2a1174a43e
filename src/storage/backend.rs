//! Storage backends
//!
//! A [`StorageBackend`] holds raw string values under string keys. Two
//! implementations are provided: [`FileBackend`] keeps values on disk and
//! survives restarts, [`MemoryBackend`] lives for the current process only.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;

use thiserror::Error;

use crate::config::{friendly_io_error_message, storage_dir};

/// Errors raised by the storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading a stored value failed
    #[error("failed to read storage key '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },
    /// Writing a value failed
    #[error("{message}")]
    Write {
        message: String,
        #[source]
        source: io::Error,
    },
    /// A value could not be serialized for storage
    #[error("failed to serialize value for storage key '{key}'")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw key/value persistence capability
///
/// Implementations only deal in strings; callers layer JSON on top.
pub trait StorageBackend: Send + Sync {
    /// Get the value stored under `key`, if any
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-lifetime backend backed by an in-memory map
///
/// Data stored here is gone when the process exits, which makes it the
/// session-scoped counterpart of [`FileBackend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Create a new empty backend
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .items
            .read()
            .map(|items| items.get(key).cloned())
            .unwrap_or_default())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Ok(mut items) = self.items.write() {
            items.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// Durable backend that keeps one file per key
///
/// Values persist across restarts. Keys are sanitized into file names, so
/// any string key is accepted.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at the given directory
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Create a backend rooted at the default durable storage directory
    pub fn durable() -> Self {
        Self::new(storage_dir())
    }

    fn file_for_key(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl StorageBackend for FileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.file_for_key(key);
        if !path.exists() {
            return Ok(None);
        }

        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| StorageError::Read {
                key: key.to_string(),
                source,
            })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let wrap = |source: io::Error, context: String| StorageError::Write {
            message: friendly_io_error_message(&source, &context),
            source,
        };

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            let context = format!("Failed to create storage directory {:?}", self.dir);
            return Err(wrap(e, context));
        }

        let path = self.file_for_key(key);
        std::fs::write(&path, value)
            .map_err(|e| wrap(e, format!("Failed to write storage key '{}'", key)))
    }
}
