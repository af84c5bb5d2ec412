//! Single-slot acknowledgement handoff between the receiver task and the
//! sender.
//!
//! The receiver calls [`AckSlot::release`] when an `ACK` frame arrives; the
//! sender calls [`AckSlot::wait`] after each frame it sends.  At most one
//! frame is ever outstanding, so one flag is enough.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct AckSlot {
    acked: AtomicBool,
    notify: Notify,
}

impl AckSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards any acknowledgement left over from an earlier frame.
    ///
    /// Call before sending the frame whose ACK will be awaited.
    pub fn reset(&self) {
        self.acked.store(false, Ordering::Release);
    }

    /// Records an acknowledgement and wakes the waiting sender.
    pub fn release(&self) {
        self.acked.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Waits until an acknowledgement is recorded, then consumes it.
    ///
    /// There is no timeout: if the ACK never arrives this never returns.
    pub async fn wait(&self) {
        loop {
            // Register interest before checking the flag so a release that
            // lands in between is not lost.
            let notified = self.notify.notified();
            if self.acked.swap(false, Ordering::AcqRel) {
                return;
            }
            notified.await;
        }
    }
}
