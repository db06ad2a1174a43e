//! Visibility signalling
//!
//! Schedulers that pause while the application surface is hidden observe
//! visibility through a watch channel. The host integrates its own
//! notification source (window focus, terminal focus, tab visibility) by
//! driving the [`VisibilityHandle`].

use tokio::sync::watch;

/// Whether the application surface is currently visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    /// Check whether this state is hidden
    pub fn is_hidden(&self) -> bool {
        matches!(self, Visibility::Hidden)
    }
}

/// Sender half of a visibility channel
///
/// Cloneable so several event sources can report into one channel.
#[derive(Debug, Clone)]
pub struct VisibilityHandle {
    tx: watch::Sender<Visibility>,
}

impl VisibilityHandle {
    /// Report a new visibility state
    pub fn set(&self, visibility: Visibility) {
        // Send only fails when every receiver is gone; nothing to do then
        let _ = self.tx.send(visibility);
    }

    /// Report that the surface became hidden
    pub fn hidden(&self) {
        self.set(Visibility::Hidden);
    }

    /// Report that the surface became visible
    pub fn visible(&self) {
        self.set(Visibility::Visible);
    }
}

/// Receiver half of a visibility channel
pub type VisibilityReceiver = watch::Receiver<Visibility>;

/// Create a visibility channel, initially visible
pub fn channel() -> (VisibilityHandle, VisibilityReceiver) {
    let (tx, rx) = watch::channel(Visibility::default());
    (VisibilityHandle { tx }, rx)
}

/// A receiver that never reports a transition
///
/// For schedulers that do not pause on hidden, so no real notification
/// source has to be wired up.
pub fn always_visible() -> VisibilityReceiver {
    channel().1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_starts_visible() {
        let (_handle, rx) = channel();
        assert_eq!(*rx.borrow(), Visibility::Visible);
    }

    #[test]
    fn test_handle_transitions_state() {
        let (handle, rx) = channel();

        handle.hidden();
        assert!(rx.borrow().is_hidden());

        handle.visible();
        assert!(!rx.borrow().is_hidden());
    }

    #[test]
    fn test_always_visible_holds_state() {
        let rx = always_visible();
        assert_eq!(*rx.borrow(), Visibility::Visible);
    }
}
