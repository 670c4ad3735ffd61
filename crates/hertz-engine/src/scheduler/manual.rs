use std::collections::VecDeque;

use parking_lot::Mutex;

use super::{FrameCallback, FrameHandle, FrameScheduler};

/// Scheduler whose frames are fired explicitly by the caller.
///
/// Nothing happens until [`ManualScheduler::fire`] is called, which makes it
/// suitable for stepping the measurement loop frame by frame in tests or
/// for hosts that already own a vsync callback and just forward it.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    next_handle: u64,
    scheduled: u64,
    cancelled: u64,
    pending: VecDeque<(FrameHandle, FrameCallback)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invokes the oldest pending callback with `timestamp`.
    ///
    /// Returns `false` if nothing was pending. The internal lock is released
    /// before the callback runs, so the callback may reschedule itself.
    pub fn fire(&self, timestamp: f64) -> bool {
        let next = self.state.lock().pending.pop_front();
        match next {
            Some((_, callback)) => {
                callback(timestamp);
                true
            }
            None => false,
        }
    }

    /// Fires up to `frames` callbacks spaced `period_ms` apart, starting at
    /// `start_ms`. Returns how many actually fired.
    pub fn fire_many(&self, frames: u32, start_ms: f64, period_ms: f64) -> u32 {
        (0..frames)
            .take_while(|&i| self.fire(start_ms + f64::from(i) * period_ms))
            .count() as u32
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Total callbacks ever scheduled, including fired and cancelled ones.
    pub fn scheduled_count(&self) -> u64 {
        self.state.lock().scheduled
    }

    pub fn cancelled_count(&self) -> u64 {
        self.state.lock().cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_next_frame(&self, callback: FrameCallback) -> FrameHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        state.scheduled += 1;
        let handle = FrameHandle(state.next_handle);
        state.pending.push_back((handle, callback));
        handle
    }

    fn cancel_scheduled_frame(&self, handle: FrameHandle) {
        let mut state = self.state.lock();
        let before = state.pending.len();
        state.pending.retain(|(h, _)| *h != handle);
        if state.pending.len() != before {
            state.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn fire_without_pending_is_noop() {
        let s = ManualScheduler::new();
        assert!(!s.fire(1.0));
        assert_eq!(s.pending_count(), 0);
    }

    #[test]
    fn fire_passes_timestamp() {
        let s = ManualScheduler::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        s.schedule_next_frame(Box::new(move |ts: f64| *sink.lock() = Some(ts)));

        assert!(s.fire(16.5));
        assert_eq!(*seen.lock(), Some(16.5));
        assert_eq!(s.pending_count(), 0);
    }

    #[test]
    fn cancel_removes_only_matching_handle() {
        let s = ManualScheduler::new();
        let a = s.schedule_next_frame(Box::new(|_: f64| {}));
        let _b = s.schedule_next_frame(Box::new(|_: f64| {}));

        s.cancel_scheduled_frame(a);
        s.cancel_scheduled_frame(a);
        assert_eq!(s.pending_count(), 1);
        assert_eq!(s.cancelled_count(), 1);
        assert_eq!(s.scheduled_count(), 2);
    }

    #[test]
    fn callback_can_reschedule_itself() {
        let s = Arc::new(ManualScheduler::new());
        let hits = Arc::new(AtomicU32::new(0));

        fn arm(s: Arc<ManualScheduler>, hits: Arc<AtomicU32>) {
            let next = s.clone();
            s.schedule_next_frame(Box::new(move |_: f64| {
                hits.fetch_add(1, Ordering::SeqCst);
                arm(next, hits);
            }));
        }

        arm(s.clone(), hits.clone());
        assert_eq!(s.fire_many(5, 0.0, 16.0), 5);
        assert_eq!(hits.load(Ordering::SeqCst), 5);
        assert_eq!(s.pending_count(), 1);
    }
}
