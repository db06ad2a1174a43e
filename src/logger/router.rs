//! Log router
//!
//! The [`Logger`] owns the active publisher and the current flow identity,
//! and forwards every log call to the publisher. It is normally constructed
//! once at startup and shared; [`Logger::global`] provides a process-wide
//! instance with default wiring for hosts that do not want to thread one
//! through.

use std::sync::{Arc, RwLock};

use anyhow::Result;
use serde_json::Value;
use tokio::sync::OnceCell;

use super::publisher::{ConsolePublisher, Publisher, DEFAULT_DOWNLOAD_FILENAME};
use super::record::{now_ms, LogLevel};

static GLOBAL: OnceCell<Logger> = OnceCell::const_new();

/// Routes log calls to the active publisher, tagging them with the current
/// flow identity
pub struct Logger {
    publisher: RwLock<Arc<dyn Publisher>>,
    flow_id: RwLock<Option<String>>,
}

impl Logger {
    /// Create a router over the given publisher
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self {
            publisher: RwLock::new(publisher),
            flow_id: RwLock::new(None),
        }
    }

    /// Get the process-wide router, constructing it on first call
    ///
    /// First access wires a default [`ConsolePublisher`] and emits one
    /// initialization record through it.
    pub async fn global() -> &'static Logger {
        GLOBAL
            .get_or_init(|| async {
                let logger = Logger::new(Arc::new(ConsolePublisher::new()));
                if let Err(e) = logger.info("logger initialized", None).await {
                    tracing::warn!("failed to record logger initialization: {:#}", e);
                }
                logger
            })
            .await
    }

    /// Start a new flow
    ///
    /// All subsequent log calls carry `"<flow_id> <start-ms>"` until another
    /// flow is started.
    pub fn start_flow(&self, flow_id: &str) {
        if let Ok(mut flow) = self.flow_id.write() {
            *flow = Some(format!("{} {}", flow_id, now_ms()));
        }
    }

    /// Swap the active publisher
    ///
    /// The replacement is immediate and unconditional; nothing buffered in
    /// the previous publisher is drained or flushed.
    pub fn add_publisher(&self, publisher: Arc<dyn Publisher>) {
        if let Ok(mut current) = self.publisher.write() {
            *current = publisher;
        }
    }

    /// Replace the active publisher's message prefix, recording the change
    pub async fn set_publisher_prefix(&self, prefix: &str) -> Result<()> {
        self.info(&format!("publisher prefix set to {}", prefix), None)
            .await?;
        self.current_publisher().set_prefix(prefix);
        Ok(())
    }

    /// Export buffered logs through the active publisher
    pub fn download_logs(&self, filename: &str) -> Result<()> {
        self.current_publisher().download_logs(filename)
    }

    /// Export buffered logs under the default filename
    pub fn download_logs_default(&self) -> Result<()> {
        self.download_logs(DEFAULT_DOWNLOAD_FILENAME)
    }

    /// Forward one log call to the active publisher
    ///
    /// Publish failures are not caught here; they surface to the caller.
    /// Callers that do not care about completion can drop the future's
    /// result after awaiting it.
    pub async fn log(&self, level: LogLevel, message: &str, context: Option<Value>) -> Result<()> {
        // Snapshot publisher and flow before awaiting so no lock is held
        // across the publish call.
        let publisher = self.current_publisher();
        let flow_id = self.current_flow();

        publisher
            .publish(level, message, context.as_ref(), flow_id.as_deref())
            .await
    }

    /// Log at INFO
    pub async fn info(&self, message: &str, context: Option<Value>) -> Result<()> {
        self.log(LogLevel::Info, message, context).await
    }

    /// Log at WARN
    pub async fn warn(&self, message: &str, context: Option<Value>) -> Result<()> {
        self.log(LogLevel::Warn, message, context).await
    }

    /// Log at ERROR
    pub async fn error(&self, message: &str, context: Option<Value>) -> Result<()> {
        self.log(LogLevel::Error, message, context).await
    }

    /// Log at DEBUG
    pub async fn debug(&self, message: &str, context: Option<Value>) -> Result<()> {
        self.log(LogLevel::Debug, message, context).await
    }

    fn current_publisher(&self) -> Arc<dyn Publisher> {
        self.publisher
            .read()
            .expect("publisher lock poisoned")
            .clone()
    }

    fn current_flow(&self) -> Option<String> {
        self.flow_id.read().map(|f| f.clone()).unwrap_or_default()
    }
}

/// Get the global router, optionally overriding the publisher prefix first
pub async fn global_with_prefix(prefix: Option<&str>) -> Result<&'static Logger> {
    let logger = Logger::global().await;
    if let Some(prefix) = prefix {
        logger.set_publisher_prefix(prefix).await?;
    }
    Ok(logger)
}
