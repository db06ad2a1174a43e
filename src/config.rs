//! Configuration management for flowlog
//!
//! Resolves the application directories (durable storage, downloaded log
//! exports) and categorizes disk errors into user-friendly messages.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Categories of disk errors for user-friendly messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskErrorKind {
    /// Disk is full or quota exceeded
    DiskFull,
    /// Permission denied (read or write)
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// Other IO error
    Other,
}

impl DiskErrorKind {
    /// Get a user-friendly message for this error kind
    pub fn user_message(&self) -> &'static str {
        match self {
            DiskErrorKind::DiskFull => "Disk full - free space needed to save",
            DiskErrorKind::PermissionDenied => "Permission denied writing to ~/.flowlog/",
            DiskErrorKind::NotFound => "File or directory not found",
            DiskErrorKind::Other => "Failed to save data",
        }
    }
}

/// Categorize an IO error into a user-friendly category
pub fn categorize_io_error(e: &std::io::Error) -> DiskErrorKind {
    use std::io::ErrorKind;

    match e.kind() {
        // Disk full errors
        ErrorKind::StorageFull => DiskErrorKind::DiskFull,
        // On some systems, disk full might appear as WriteZero or Other
        ErrorKind::WriteZero => DiskErrorKind::DiskFull,

        // Permission errors
        ErrorKind::PermissionDenied => DiskErrorKind::PermissionDenied,

        // Not found
        ErrorKind::NotFound => DiskErrorKind::NotFound,

        // Check raw OS error for disk full on Unix
        _ => {
            #[cfg(unix)]
            {
                if let Some(os_error) = e.raw_os_error() {
                    // ENOSPC (No space left on device) = 28 on Linux, 28 on macOS
                    // EDQUOT (Disk quota exceeded) = 122 on Linux, 69 on macOS
                    if os_error == 28 || os_error == 122 || os_error == 69 {
                        return DiskErrorKind::DiskFull;
                    }
                    // EACCES = 13 on both
                    if os_error == 13 {
                        return DiskErrorKind::PermissionDenied;
                    }
                }
            }
            DiskErrorKind::Other
        }
    }
}

/// Create a user-friendly error message from an IO error
pub fn friendly_io_error_message(e: &std::io::Error, context: &str) -> String {
    let kind = categorize_io_error(e);
    match kind {
        DiskErrorKind::DiskFull => format!("{}: {}", context, kind.user_message()),
        DiskErrorKind::PermissionDenied => format!("{}: {}", context, kind.user_message()),
        DiskErrorKind::NotFound => format!("{}: file or directory not found", context),
        DiskErrorKind::Other => format!("{}: {}", context, e),
    }
}

/// Get the base application directory (~/.flowlog)
/// Falls back to ./.flowlog if home directory cannot be determined
pub fn data_dir() -> PathBuf {
    try_data_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for data");
        PathBuf::from(".flowlog")
    })
}

/// Try to get the base application directory, returning None if home dir is unavailable
pub fn try_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".flowlog"))
}

/// Get the directory backing the durable storage adapter
pub fn storage_dir() -> PathBuf {
    data_dir().join("storage")
}

/// Get the directory log exports are downloaded into
///
/// Prefers the platform downloads directory; falls back to
/// `~/.flowlog/downloads` when the platform does not define one.
pub fn downloads_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| data_dir().join("downloads"))
}

/// Ensure all required directories exist
pub fn ensure_directories() -> Result<()> {
    std::fs::create_dir_all(data_dir()).context("Failed to create data directory")?;

    std::fs::create_dir_all(storage_dir()).context("Failed to create storage directory")?;

    std::fs::create_dir_all(downloads_dir()).context("Failed to create downloads directory")?;

    Ok(())
}
