//! Frame scheduling seam between the player and the host's redraw loop.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

/// Handle to one requested frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// Host-side frame scheduling (an animation-frame request in a browser,
/// a vsync callback in a native window).
///
/// When a requested frame fires, the host calls `Player::on_frame`.
pub trait FrameScheduler {
    fn request_frame(&self) -> FrameHandle;
    fn cancel_frame(&self, handle: FrameHandle);
}

/// Scheduler that only records requests. The host (or a test) checks
/// `pending()` and drives `Player::on_frame` itself.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: Cell<u64>,
    pending: Cell<Option<FrameHandle>>,
    requested: Cell<u64>,
    cancelled: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently requested frame that has not been cancelled or taken.
    #[inline]
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending.get()
    }

    /// Mark the pending frame as fired and return it.
    #[inline]
    pub fn take_pending(&self) -> Option<FrameHandle> {
        self.pending.take()
    }

    /// Total frames requested so far.
    #[inline]
    pub fn requested(&self) -> u64 {
        self.requested.get()
    }

    /// Total cancellations of a pending frame.
    #[inline]
    pub fn cancelled(&self) -> u64 {
        self.cancelled.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self) -> FrameHandle {
        let handle = FrameHandle(self.next.get());
        self.next.set(self.next.get().wrapping_add(1));
        self.requested.set(self.requested.get() + 1);
        self.pending.set(Some(handle));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if self.pending.get() == Some(handle) {
            self.pending.set(None);
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}
