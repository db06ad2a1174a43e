//! Log record types

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a log record
///
/// `Info`, `Warn` and `Error` route to the matching console channel;
/// everything else routes to the generic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    /// Get the display name for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log record as persisted in the bounded buffer
///
/// Immutable once created. The context value is stored in its serialized
/// string form, not as structured JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Severity
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// JSON-stringified context value; `"{}"` when none was supplied
    pub context: String,
}

impl LogRecord {
    /// Create a record stamped with the current time
    pub fn new(level: LogLevel, message: impl Into<String>, context: Option<&Value>) -> Self {
        Self {
            timestamp: now_ms(),
            level,
            message: message.into(),
            context: stringify_context(context),
        }
    }
}

/// Current time in milliseconds since the Unix epoch
pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn stringify_context(context: Option<&Value>) -> String {
    match context {
        Some(value) => value.to_string(),
        None => "{}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"WARN\"");
        let level: LogLevel = serde_json::from_str("\"ERROR\"").unwrap();
        assert_eq!(level, LogLevel::Error);
    }

    #[test]
    fn test_record_stringifies_context() {
        let record = LogRecord::new(LogLevel::Info, "msg", Some(&json!({"k": 1})));
        assert_eq!(record.context, "{\"k\":1}");
    }

    #[test]
    fn test_record_without_context() {
        let record = LogRecord::new(LogLevel::Debug, "msg", None);
        assert_eq!(record.context, "{}");
    }

    #[test]
    fn test_record_roundtrip() {
        let record = LogRecord::new(LogLevel::Error, "boom", Some(&json!(["a", "b"])));
        let raw = serde_json::to_string(&record).unwrap();
        let parsed: LogRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, record);
    }
}
