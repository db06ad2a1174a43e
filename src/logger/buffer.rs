//! Bounded persisted log buffer
//!
//! The [`LogStore`] keeps the most recent records as one JSON-array blob in
//! a storage backend, evicting oldest-first once the bound is reached, and
//! can export the full buffer as a pretty-printed JSON download.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::config::{downloads_dir, friendly_io_error_message};
use crate::storage::StorageBackend;

use super::record::LogRecord;

/// Storage key the buffer blob lives under, independent from the keyed
/// application blob.
const LOG_STORAGE_KEY: &str = "flowlog_console_logs";

/// Default number of records retained
pub const DEFAULT_MAX_LOGS: usize = 1000;

/// Bounded, oldest-evicted record store persisted through a backend
pub struct LogStore {
    backend: Arc<dyn StorageBackend>,
    downloads_dir: PathBuf,
    max_logs: usize,
}

impl LogStore {
    /// Create a store with the default bound, downloading into the
    /// platform downloads directory
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            downloads_dir: downloads_dir(),
            max_logs: DEFAULT_MAX_LOGS,
        }
    }

    /// Override the download target directory
    pub fn with_downloads_dir(mut self, dir: PathBuf) -> Self {
        self.downloads_dir = dir;
        self
    }

    /// Override the retention bound
    pub fn with_max_logs(mut self, max_logs: usize) -> Self {
        self.max_logs = max_logs;
        self
    }

    /// Append a record, evicting the oldest records once the bound is hit
    ///
    /// The full sequence is read, modified and persisted back on every call.
    /// O(n) per append, acceptable at the default bound.
    pub fn append(&self, record: LogRecord) -> Result<()> {
        let mut records = self.read_all();
        records.push(record);

        if records.len() > self.max_logs {
            let overflow = records.len() - self.max_logs;
            records.drain(0..overflow);
        }

        let raw = serde_json::to_string(&records).context("Failed to serialize log buffer")?;
        self.backend
            .set_item(LOG_STORAGE_KEY, &raw)
            .context("Failed to persist log buffer")?;
        Ok(())
    }

    /// Read the stored sequence, oldest first
    ///
    /// A missing or corrupted blob reads as empty.
    pub fn read_all(&self) -> Vec<LogRecord> {
        match self.backend.get_item(LOG_STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("stored log buffer is corrupted, starting empty: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("failed to read log buffer, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Export the buffer as pretty-printed JSON into the downloads directory
    ///
    /// An empty buffer reports a diagnostic and writes nothing; the path of
    /// the written file is returned otherwise.
    pub fn download(&self, filename: &str) -> Result<Option<PathBuf>> {
        let records = self.read_all();
        if records.is_empty() {
            error!("no logs stored till now, please try again later");
            return Ok(None);
        }

        let content =
            serde_json::to_string_pretty(&records).context("Failed to serialize log records")?;

        std::fs::create_dir_all(&self.downloads_dir)
            .context("Failed to create downloads directory")?;

        let path = self.downloads_dir.join(filename);
        std::fs::write(&path, content)
            .map_err(|e| anyhow::anyhow!(friendly_io_error_message(&e, "Failed to write log export")))?;

        Ok(Some(path))
    }
}
