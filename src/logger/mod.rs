//! Flow-aware structured logging
//!
//! Log calls go through a [`Logger`] router, which tags them with the
//! current flow identity and forwards them to the active [`Publisher`].
//! The default publisher emits to the console channel and keeps a bounded
//! rolling buffer of records that can be exported as a JSON download.

mod buffer;
mod console;
mod publisher;
mod record;
mod router;

pub use buffer::{LogStore, DEFAULT_MAX_LOGS};
pub use console::{install_default_subscriber, Console, TracingConsole};
pub use publisher::{ConsolePublisher, Publisher, DEFAULT_DOWNLOAD_FILENAME, DEFAULT_PREFIX};
pub use record::{LogLevel, LogRecord};
pub use router::{global_with_prefix, Logger};
