//! Periodic polling with overlap suppression and visibility pausing
//!
//! A [`PollingScheduler`] drives a [`PollSource`] on a fixed cadence from
//! one dedicated task per session. A tick is skipped entirely while the
//! previous poll is still in flight, or while the surface is hidden and the
//! session is configured to pause. Successful payloads are forwarded on the
//! configured channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::visibility::VisibilityReceiver;

/// Asynchronous producer polled on a fixed cadence
///
/// The owning component implements this; the scheduler never retries a
/// failed poll and imposes no timeout. A poll that never resolves blocks
/// every future poll of its session.
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    /// Payload produced by each successful poll
    type Payload: Send + 'static;

    /// Produce the next payload
    async fn poll(&self) -> Result<Self::Payload>;
}

/// Configuration for a [`PollingScheduler`]
pub struct PollingConfig<T> {
    /// Tick cadence, must be positive
    pub interval: Duration,
    /// Skip ticks while the surface is hidden. Off by default; sessions
    /// that poll regardless of visibility leave this false.
    pub pause_when_hidden: bool,
    /// Payloads of successful polls are forwarded here
    pub on_change: mpsc::UnboundedSender<T>,
}

/// Live state of a started scheduler
struct PollingSession {
    task: JoinHandle<()>,
    stopped: Arc<AtomicBool>,
}

/// Periodic task runner over a [`PollSource`]
pub struct PollingScheduler<S: PollSource> {
    source: Arc<S>,
    config: PollingConfig<S::Payload>,
    visibility: VisibilityReceiver,
    session: Option<PollingSession>,
}

impl<S: PollSource> PollingScheduler<S> {
    /// Create a stopped scheduler
    ///
    /// Use [`always_visible`](super::visibility::always_visible) as the
    /// receiver when no visibility source exists.
    pub fn new(
        source: Arc<S>,
        config: PollingConfig<S::Payload>,
        visibility: VisibilityReceiver,
    ) -> Self {
        Self {
            source,
            config,
            visibility,
            session: None,
        }
    }

    /// Check whether a session is currently running
    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Start the session
    ///
    /// Spawns the dedicated tick task. The first poll happens one interval
    /// after start. Visibility is not checked here; pausing begins with the
    /// first hidden transition observed by the running session.
    pub fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("polling scheduler already running");
            return Ok(());
        }
        ensure!(
            !self.config.interval.is_zero(),
            "polling interval must be positive"
        );

        let stopped = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_session(
            Arc::clone(&self.source),
            self.config.interval,
            self.config.pause_when_hidden,
            self.config.on_change.clone(),
            self.visibility.clone(),
            Arc::clone(&stopped),
        ));

        self.session = Some(PollingSession { task, stopped });
        Ok(())
    }

    /// Stop the session
    ///
    /// Cancels the timer and drops the visibility observer; no further
    /// ticks occur. A poll already in flight is not cancelled, but its
    /// eventual result is dropped instead of being forwarded.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            debug!("polling scheduler already stopped");
            return;
        };

        session.stopped.store(true, Ordering::Release);
        session.task.abort();
    }
}

impl<S: PollSource> Drop for PollingScheduler<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_session<S: PollSource>(
    source: Arc<S>,
    interval: Duration,
    pause_when_hidden: bool,
    on_change: mpsc::UnboundedSender<S::Payload>,
    mut visibility: VisibilityReceiver,
    stopped: Arc<AtomicBool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // Consume the immediate first tick so polling starts one interval in
    ticker.tick().await;

    // Only the visibility branch writes `paused`; each tick reads it fresh.
    // A session started while already hidden pauses at the first observed
    // transition, not before.
    let mut paused = false;
    let mut visibility_open = true;
    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if paused && pause_when_hidden {
                    continue;
                }
                if in_flight.as_ref().map_or(false, |h| !h.is_finished()) {
                    continue;
                }

                let source = Arc::clone(&source);
                let on_change = on_change.clone();
                let stopped = Arc::clone(&stopped);
                in_flight = Some(tokio::spawn(async move {
                    // Task completion is the in-flight marker, so it clears
                    // on success, failure and panic alike.
                    match source.poll().await {
                        Ok(payload) => {
                            if stopped.load(Ordering::Acquire) {
                                debug!("dropping poll result that resolved after stop");
                            } else {
                                let _ = on_change.send(payload);
                            }
                        }
                        Err(e) => warn!("poll failed: {:#}", e),
                    }
                }));
            }
            changed = visibility.changed(), if visibility_open => {
                match changed {
                    Ok(()) => paused = visibility.borrow().is_hidden(),
                    // Source gone; the last observed state stands
                    Err(_) => visibility_open = false,
                }
            }
        }
    }
}
