//! Resilient periodic polling
//!
//! [`PollingScheduler`] runs a [`PollSource`] on a fixed cadence, skipping
//! ticks while a previous poll is still in flight and, optionally, while
//! the application surface is hidden. Visibility comes in through the
//! [`visibility`] channel.

mod scheduler;
pub mod visibility;

pub use scheduler::{PollSource, PollingConfig, PollingScheduler};
pub use visibility::{Visibility, VisibilityHandle, VisibilityReceiver};
