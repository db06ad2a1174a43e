//! Log publishers
//!
//! A [`Publisher`] is the replaceable sink every routed log call lands in.
//! The default [`ConsolePublisher`] formats each message, emits it on the
//! console channel and appends it to the bounded persisted buffer. Custom
//! sinks (remote shippers, test recorders) implement the same trait and are
//! swapped in at runtime through the router.

use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::storage::MemoryBackend;

use super::buffer::LogStore;
use super::console::{Console, TracingConsole};
use super::record::{now_ms, LogRecord, LogLevel};

/// Default tag prepended to every formatted line
pub const DEFAULT_PREFIX: &str = "FLOWLOG";

/// Default filename for log downloads
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "logs.json";

/// Replaceable log sink
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one log call
    ///
    /// `flow_id` carries the router's current flow identity; sinks that have
    /// no grouping concept ignore it.
    async fn publish(
        &self,
        level: LogLevel,
        message: &str,
        context: Option<&Value>,
        flow_id: Option<&str>,
    ) -> Result<()>;

    /// Replace the tag prepended to subsequently formatted messages
    fn set_prefix(&self, prefix: &str);

    /// Export buffered logs under the given filename
    ///
    /// Sinks without a buffer keep the default no-op.
    fn download_logs(&self, _filename: &str) -> Result<()> {
        Ok(())
    }
}

/// Default sink: console emission plus the bounded persisted buffer
pub struct ConsolePublisher {
    prefix: RwLock<String>,
    /// Flow currently grouped on the console, if any
    current_flow: RwLock<Option<String>>,
    console: Arc<dyn Console>,
    store: LogStore,
}

impl ConsolePublisher {
    /// Create a publisher over a fresh session-scoped buffer and the
    /// tracing console
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(TracingConsole),
            LogStore::new(Arc::new(MemoryBackend::new())),
        )
    }

    /// Create a publisher over an explicit console and buffer
    pub fn with_parts(console: Arc<dyn Console>, store: LogStore) -> Self {
        Self {
            prefix: RwLock::new(DEFAULT_PREFIX.to_string()),
            current_flow: RwLock::new(None),
            console,
            store,
        }
    }

    /// Close the previous visual group and open one for `flow_id` when the
    /// flow changed. Console-only; the buffer is not affected.
    fn transition_flow_group(&self, flow_id: Option<&str>) {
        let Some(flow) = flow_id.filter(|f| !f.is_empty()) else {
            return;
        };

        if let Ok(mut current) = self.current_flow.write() {
            if current.as_deref() != Some(flow) {
                if current.is_some() {
                    self.console.group_end();
                }
                self.console.group_start(flow);
                *current = Some(flow.to_string());
            }
        }
    }

    fn format_message(&self, level: LogLevel, message: &str, context: Option<&Value>) -> String {
        let prefix = self
            .prefix
            .read()
            .map(|p| p.clone())
            .unwrap_or_else(|_| DEFAULT_PREFIX.to_string());

        let mut formatted = format!("[{}] [{}] {}: {}", prefix, now_ms(), level, message);
        if let Some(context) = context {
            formatted.push(' ');
            formatted.push_str(&context.to_string());
        }
        formatted
    }

    fn emit(&self, level: LogLevel, formatted: &str) {
        match level {
            LogLevel::Info => self.console.info(formatted),
            LogLevel::Warn => self.console.warn(formatted),
            LogLevel::Error => self.console.error(formatted),
            _ => self.console.log(formatted),
        }
    }
}

impl Default for ConsolePublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for ConsolePublisher {
    async fn publish(
        &self,
        level: LogLevel,
        message: &str,
        context: Option<&Value>,
        flow_id: Option<&str>,
    ) -> Result<()> {
        // A JSON null context counts as absent
        let context = context.filter(|v| !v.is_null());

        self.transition_flow_group(flow_id);

        let formatted = self.format_message(level, message, context);

        // Console first: a failing buffer write must never suppress the
        // visible line.
        self.emit(level, &formatted);

        self.store.append(LogRecord::new(level, message, context))
    }

    fn set_prefix(&self, prefix: &str) {
        if let Ok(mut current) = self.prefix.write() {
            *current = prefix.to_string();
        }
    }

    fn download_logs(&self, filename: &str) -> Result<()> {
        self.store.download(filename).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageBackend, StorageError};
    use std::sync::Mutex;

    /// Console that records every call for assertions
    #[derive(Default)]
    pub(crate) struct RecordingConsole {
        pub(crate) calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingConsole {
        fn record(&self, channel: &str, message: &str) {
            self.calls
                .lock()
                .unwrap()
                .push((channel.to_string(), message.to_string()));
        }

        pub(crate) fn channels(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(c, _)| c.clone())
                .collect()
        }
    }

    impl Console for RecordingConsole {
        fn info(&self, message: &str) {
            self.record("info", message);
        }
        fn warn(&self, message: &str) {
            self.record("warn", message);
        }
        fn error(&self, message: &str) {
            self.record("error", message);
        }
        fn log(&self, message: &str) {
            self.record("log", message);
        }
        fn group_start(&self, label: &str) {
            self.record("group_start", label);
        }
        fn group_end(&self) {
            self.record("group_end", "");
        }
    }

    /// Backend whose writes always fail, for persistence-failure tests
    struct BrokenBackend;

    impl StorageBackend for BrokenBackend {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set_item(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                message: format!("storage quota exceeded for '{}'", key),
                source: std::io::Error::new(std::io::ErrorKind::Other, "quota"),
            })
        }
    }

    fn test_publisher() -> (Arc<RecordingConsole>, ConsolePublisher) {
        let console = Arc::new(RecordingConsole::default());
        let store = LogStore::new(Arc::new(MemoryBackend::new()));
        let publisher = ConsolePublisher::with_parts(Arc::clone(&console) as Arc<dyn Console>, store);
        (console, publisher)
    }

    #[tokio::test]
    async fn test_publish_routes_by_level() {
        let (console, publisher) = test_publisher();

        publisher
            .publish(LogLevel::Info, "a", None, None)
            .await
            .unwrap();
        publisher
            .publish(LogLevel::Warn, "b", None, None)
            .await
            .unwrap();
        publisher
            .publish(LogLevel::Error, "c", None, None)
            .await
            .unwrap();
        publisher
            .publish(LogLevel::Debug, "d", None, None)
            .await
            .unwrap();

        assert_eq!(console.channels(), vec!["info", "warn", "error", "log"]);
    }

    #[tokio::test]
    async fn test_publish_formats_message() {
        let (console, publisher) = test_publisher();
        publisher.set_prefix("api");

        publisher
            .publish(
                LogLevel::Info,
                "request done",
                Some(&serde_json::json!({"status": 200})),
                None,
            )
            .await
            .unwrap();

        let calls = console.calls.lock().unwrap();
        let (_, line) = &calls[0];
        assert!(line.starts_with("[api] ["));
        assert!(line.contains("] INFO: request done {\"status\":200}"));
    }

    #[tokio::test]
    async fn test_publish_omits_absent_context() {
        let (console, publisher) = test_publisher();

        publisher
            .publish(LogLevel::Info, "plain", None, None)
            .await
            .unwrap();

        let calls = console.calls.lock().unwrap();
        let (_, line) = &calls[0];
        assert!(line.ends_with("INFO: plain"));
    }

    #[tokio::test]
    async fn test_flow_group_transitions() {
        let (console, publisher) = test_publisher();

        publisher
            .publish(LogLevel::Info, "1", None, Some("flow-a 100"))
            .await
            .unwrap();
        publisher
            .publish(LogLevel::Info, "2", None, Some("flow-a 100"))
            .await
            .unwrap();
        publisher
            .publish(LogLevel::Info, "3", None, Some("flow-b 200"))
            .await
            .unwrap();

        let channels = console.channels();
        // One group for flow-a covering two messages, closed when flow-b opens
        assert_eq!(
            channels,
            vec![
                "group_start",
                "info",
                "info",
                "group_end",
                "group_start",
                "info"
            ]
        );
    }

    #[tokio::test]
    async fn test_publish_without_flow_opens_no_group() {
        let (console, publisher) = test_publisher();

        publisher
            .publish(LogLevel::Info, "1", None, None)
            .await
            .unwrap();

        assert_eq!(console.channels(), vec!["info"]);
    }

    #[tokio::test]
    async fn test_publish_appends_record() {
        let console = Arc::new(RecordingConsole::default());
        let backend = Arc::new(MemoryBackend::new());
        let store = LogStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);
        let publisher = ConsolePublisher::with_parts(console, store);

        publisher
            .publish(
                LogLevel::Warn,
                "careful",
                Some(&serde_json::json!({"attempt": 2})),
                None,
            )
            .await
            .unwrap();

        let records = LogStore::new(backend).read_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Warn);
        assert_eq!(records[0].message, "careful");
        assert_eq!(records[0].context, "{\"attempt\":2}");
    }

    #[tokio::test]
    async fn test_null_context_treated_as_absent() {
        let (console, publisher) = test_publisher();

        publisher
            .publish(LogLevel::Info, "plain", Some(&Value::Null), None)
            .await
            .unwrap();

        let calls = console.calls.lock().unwrap();
        let (_, line) = &calls[0];
        assert!(line.ends_with("INFO: plain"));
    }

    #[tokio::test]
    async fn test_download_logs_delegates_to_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let console = Arc::new(RecordingConsole::default());
        let store = LogStore::new(Arc::new(MemoryBackend::new()))
            .with_downloads_dir(temp_dir.path().to_path_buf());
        let publisher = ConsolePublisher::with_parts(console, store);

        publisher
            .publish(LogLevel::Info, "kept", None, None)
            .await
            .unwrap();
        publisher.download_logs("out.json").unwrap();

        assert!(temp_dir.path().join("out.json").exists());
    }

    #[tokio::test]
    async fn test_persistence_failure_still_emits_console_line() {
        let console = Arc::new(RecordingConsole::default());
        let store = LogStore::new(Arc::new(BrokenBackend));
        let publisher =
            ConsolePublisher::with_parts(Arc::clone(&console) as Arc<dyn Console>, store);

        let result = publisher.publish(LogLevel::Error, "lost", None, None).await;

        assert!(result.is_err());
        assert_eq!(console.channels(), vec!["error"]);
    }
}
