//! flowlog - Structured flow logging with pluggable sinks and a
//! visibility-aware polling scheduler
//!
//! Log calls are routed through a [`logger::Logger`] that groups related
//! messages into flows and persists a bounded rolling buffer through the
//! [`storage`] layer. The [`polling`] module provides a periodic-task
//! runner that never overlaps poll calls and can pause while the
//! application surface is hidden.

pub mod config;
pub mod logger;
pub mod polling;
pub mod storage;
