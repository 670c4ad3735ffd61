use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use super::{FrameCallback, FrameHandle, FrameScheduler};
use crate::error::HertzError;

/// Scheduler that emulates a fixed-rate vsync with tokio timers.
///
/// Frames sit on a grid anchored at the first schedule call: frame `k` is due
/// at `origin + k * period` and reports a timestamp of `k * period` in
/// milliseconds. Timestamps therefore stay evenly spaced even when the timer
/// wakes a little late, and frames missed while idle are skipped the way a
/// real display skips vblanks nobody waited for.
///
/// Must be used from within a tokio runtime.
pub struct PacedScheduler {
    shared: Arc<Shared>,
}

struct Shared {
    period: Duration,
    frame_limit: Option<u64>,
    state: Mutex<PacedState>,
}

#[derive(Default)]
struct PacedState {
    origin: Option<Instant>,
    last_frame: u64,
    delivered: u64,
    next_handle: u64,
    tasks: HashMap<FrameHandle, AbortHandle>,
}

impl PacedScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                period,
                frame_limit: None,
                state: Mutex::new(PacedState::default()),
            }),
        }
    }

    /// Scheduler ticking at `hz` frames per second.
    pub fn from_hz(hz: f64) -> Result<Self, HertzError> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(HertzError::config(format!("paced rate must be positive, got {hz}")));
        }
        Ok(Self::new(Duration::from_secs_f64(1.0 / hz)))
    }

    /// Stops delivering after `frames` callbacks; later callbacks stay
    /// pending forever.
    pub fn with_frame_limit(self, frames: u64) -> Self {
        let period = self.shared.period;
        Self {
            shared: Arc::new(Shared {
                period,
                frame_limit: Some(frames),
                state: Mutex::new(PacedState::default()),
            }),
        }
    }

    pub fn period(&self) -> Duration {
        self.shared.period
    }

    /// Callbacks delivered so far.
    pub fn delivered(&self) -> u64 {
        self.shared.state.lock().delivered
    }

    /// Callbacks scheduled but neither fired nor cancelled.
    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }
}

impl Shared {
    fn timestamp_ms(&self, frame: u64) -> f64 {
        self.period.as_nanos() as f64 * frame as f64 / 1_000_000.0
    }

    /// Invoked by the timer task once its frame is due. Returns `false` when
    /// the handle was cancelled meanwhile or the frame limit is exhausted.
    fn claim_delivery(&self, handle: FrameHandle) -> bool {
        let mut state = self.state.lock();
        if state.tasks.remove(&handle).is_none() {
            return false;
        }
        if self.frame_limit.is_some_and(|limit| state.delivered >= limit) {
            return false;
        }
        state.delivered += 1;
        true
    }
}

impl FrameScheduler for PacedScheduler {
    fn schedule_next_frame(&self, callback: FrameCallback) -> FrameHandle {
        let shared = Arc::clone(&self.shared);
        let mut state = self.shared.state.lock();

        let now = Instant::now();
        let origin = *state.origin.get_or_insert(now);
        let period = self.shared.period.as_secs_f64();
        let due = if period > 0.0 {
            (now.saturating_duration_since(origin).as_secs_f64() / period).ceil() as u64
        } else {
            0
        };
        let frame = (state.last_frame + 1).max(due);
        state.last_frame = frame;

        state.next_handle += 1;
        let handle = FrameHandle(state.next_handle);

        let deadline = origin + self.shared.period.mul_f64(frame as f64);
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if shared.claim_delivery(handle) {
                callback(shared.timestamp_ms(frame));
            }
        });
        state.tasks.insert(handle, task.abort_handle());

        handle
    }

    fn cancel_scheduled_frame(&self, handle: FrameHandle) {
        if let Some(task) = self.shared.state.lock().tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for PacedScheduler {
    fn drop(&mut self) {
        for (_, task) in self.shared.state.lock().tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<f64>>>, impl Fn() -> FrameCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let make = move || -> FrameCallback {
            let sink = sink.clone();
            Box::new(move |ts: f64| sink.lock().push(ts))
        };
        (seen, make)
    }

    #[test]
    fn from_hz_rejects_non_positive_rates() {
        assert!(PacedScheduler::from_hz(0.0).is_err());
        assert!(PacedScheduler::from_hz(-60.0).is_err());
        assert!(PacedScheduler::from_hz(f64::NAN).is_err());
        assert!(PacedScheduler::from_hz(60.0).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn fires_on_period_grid() {
        let s = PacedScheduler::new(Duration::from_millis(10));
        let (seen, make) = recorder();

        s.schedule_next_frame(make());
        tokio::time::sleep(Duration::from_millis(15)).await;
        assert_eq!(*seen.lock(), vec![10.0]);

        s.schedule_next_frame(make());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*seen.lock(), vec![10.0, 20.0]);
        assert_eq!(s.delivered(), 2);
        assert_eq!(s.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_frames_are_skipped() {
        let s = PacedScheduler::new(Duration::from_millis(10));
        let (seen, make) = recorder();

        s.schedule_next_frame(make());
        tokio::time::sleep(Duration::from_millis(55)).await;
        s.schedule_next_frame(make());
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(*seen.lock(), vec![10.0, 60.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_frame_never_fires() {
        let s = PacedScheduler::new(Duration::from_millis(10));
        let hits = Arc::new(AtomicU32::new(0));
        let h = hits.clone();

        let handle = s.schedule_next_frame(Box::new(move |_: f64| {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        s.cancel_scheduled_frame(handle);
        s.cancel_scheduled_frame(handle);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(s.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn frame_limit_caps_deliveries() {
        let s = PacedScheduler::new(Duration::from_millis(5)).with_frame_limit(2);
        let (seen, make) = recorder();

        for _ in 0..4 {
            s.schedule_next_frame(make());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(seen.lock().len(), 2);
        assert_eq!(s.delivered(), 2);
    }
}
