//! Frame scheduling seam.
//!
//! The estimator never talks to a display directly. It asks a
//! [`FrameScheduler`] to call it back on the next frame and, when done,
//! cancels whatever callback is still pending. Hosts plug in their own
//! vsync source; two implementations ship with the crate:
//! - [`PacedScheduler`] fires on a fixed period using tokio timers
//! - [`ManualScheduler`] fires only when the caller says so

mod manual;
mod paced;

pub use manual::ManualScheduler;
pub use paced::PacedScheduler;

/// Callback invoked once with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64) + Send + 'static>;

/// Identifies one scheduled callback for cancellation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameHandle(pub u64);

/// Host frame-callback primitive.
pub trait FrameScheduler: Send + Sync + 'static {
    /// Schedules `callback` for the next frame.
    ///
    /// Timestamps passed to successive callbacks must not decrease.
    /// Implementations must not invoke `callback` before returning.
    fn schedule_next_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Cancels a pending callback. No-op if it already fired or was cancelled.
    fn cancel_scheduled_frame(&self, handle: FrameHandle);
}

impl<S: FrameScheduler> FrameScheduler for std::sync::Arc<S> {
    fn schedule_next_frame(&self, callback: FrameCallback) -> FrameHandle {
        (**self).schedule_next_frame(callback)
    }

    fn cancel_scheduled_frame(&self, handle: FrameHandle) {
        (**self).cancel_scheduled_frame(handle)
    }
}
