//! Namespaced keyed store
//!
//! A [`KeyedStore`] keeps all of an application's values inside one JSON
//! object blob, stored under a single namespaced key in a backend. Reads of
//! a missing or corrupted blob fall back to an empty object rather than
//! failing, so callers never see a parse error for state they did not write.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::backend::{FileBackend, MemoryBackend, StorageBackend, StorageError};

/// Fixed namespace for deriving the application blob key. The derived key
/// only needs to be stable and collision-free per application.
const STORAGE_NAMESPACE: Uuid = uuid::uuid!("0c6bfe54-9a3d-47a1-8a64-2f1de3a9b0c4");

const APP_NAME: &str = "flowlog";

/// Generic get/set over one namespaced JSON blob
///
/// Two independently created stores over different backends share no state;
/// two stores over the same backend read and write the same blob.
pub struct KeyedStore {
    backend: Arc<dyn StorageBackend>,
    blob_key: String,
}

impl KeyedStore {
    /// Create a store over the given backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            blob_key: Uuid::new_v5(&STORAGE_NAMESPACE, APP_NAME.as_bytes()).to_string(),
        }
    }

    /// Store backed by the durable file backend
    pub fn durable() -> Self {
        Self::new(Arc::new(FileBackend::durable()))
    }

    /// Store backed by a fresh session-scoped memory backend
    pub fn session() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Get the value stored under `key`, deserialized as `T`
    ///
    /// Returns `Ok(None)` when the blob or the key is missing, or when the
    /// stored value does not deserialize as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let mut blob = self.read_blob()?;

        let Some(value) = blob.remove(key) else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                tracing::warn!("stored value under '{}' does not deserialize: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Store `value` under `key`
    ///
    /// The whole blob is read, updated and written back. Writes from
    /// concurrent stores over the same backend can interleave; callers that
    /// share a backend across tasks must serialize their own access.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let mut blob = self.read_blob()?;

        let value = serde_json::to_value(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        blob.insert(key.to_string(), value);

        let raw = serde_json::to_string(&Value::Object(blob)).map_err(|source| {
            StorageError::Serialize {
                key: key.to_string(),
                source,
            }
        })?;
        self.backend.set_item(&self.blob_key, &raw)
    }

    fn read_blob(&self) -> Result<Map<String, Value>, StorageError> {
        let Some(raw) = self.backend.get_item(&self.blob_key)? else {
            return Ok(Map::new());
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                // Corrupted blob. Recover with empty state instead of
                // surfacing a parse error for every subsequent call.
                tracing::warn!("stored blob under '{}' is not a JSON object", self.blob_key);
                Ok(Map::new())
            }
        }
    }
}
