//! Console output channel
//!
//! The [`Console`] trait is the severity-routed diagnostic channel log lines
//! are emitted to. The default [`TracingConsole`] routes everything through
//! the `tracing` macros, so a host application controls the actual output
//! with its subscriber configuration.

use anyhow::Result;
use tracing::{debug, error, info, trace, warn};

/// Severity-routed diagnostic output
///
/// Emission must be infallible; implementations swallow their own failures.
pub trait Console: Send + Sync {
    /// Informational line
    fn info(&self, message: &str);
    /// Warning line
    fn warn(&self, message: &str);
    /// Error line
    fn error(&self, message: &str);
    /// Generic line, used for any level without a dedicated channel
    fn log(&self, message: &str);
    /// Open a visual group for a flow. Presentation only.
    fn group_start(&self, label: &str);
    /// Close the currently open group, if any. Presentation only.
    fn group_end(&self);
}

/// Console implementation over the `tracing` macros
#[derive(Debug, Default)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }

    fn log(&self, message: &str) {
        debug!("{}", message);
    }

    fn group_start(&self, label: &str) {
        info!("Flow: {}", label);
    }

    fn group_end(&self) {
        // tracing has no grouping concept; the marker keeps transitions
        // visible when reading raw output
        trace!("flow group closed");
    }
}

/// Install a default `tracing` subscriber for hosts that have none
///
/// Respects `RUST_LOG`, defaulting to `flowlog=info`. Fails if a global
/// subscriber is already installed.
pub fn install_default_subscriber() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flowlog=info".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}
