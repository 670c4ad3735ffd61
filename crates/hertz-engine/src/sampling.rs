use crate::scheduler::FrameHandle;

/// Per-estimator sampling state.
///
/// A window opens on the first frame after a reset and closes once more than
/// `min_samples_per_window` frames have been counted. Closing a window yields
/// one frames-per-second estimate averaged over the whole window.
#[derive(Debug, Clone)]
pub struct SamplingState {
    window_start: Option<f64>,
    sample_count: u32,
    min_samples_per_window: u32,
    last_estimated_fps: Option<f64>,
    pub(crate) pending: Option<FrameHandle>,
    /// Generation of the loop currently allowed to reschedule itself.
    pub(crate) active_loop: Option<u64>,
    pub(crate) loops_started: u64,
}

impl SamplingState {
    pub fn new(min_samples_per_window: u32) -> Self {
        Self {
            window_start: None,
            sample_count: 0,
            min_samples_per_window,
            last_estimated_fps: None,
            pending: None,
            active_loop: None,
            loops_started: 0,
        }
    }

    /// Clears the window and any previous estimate.
    ///
    /// The pending handle and loop generation are owned by start/stop and are
    /// left untouched.
    pub fn reset(&mut self) {
        self.window_start = None;
        self.sample_count = 0;
        self.last_estimated_fps = None;
    }

    /// Records one frame callback and returns the estimate if this frame
    /// closed the window.
    ///
    /// Timestamps are milliseconds. The result is floored to whole frames
    /// per second. A non-advancing clock produces a non-finite or
    /// non-positive estimate here; rejecting it is left to classification.
    pub fn record_frame(&mut self, timestamp: f64) -> Option<f64> {
        let start = *self.window_start.get_or_insert(timestamp);
        self.sample_count += 1;

        if self.sample_count <= self.min_samples_per_window {
            return None;
        }

        let elapsed = timestamp - start;
        let fps = (1000.0 * f64::from(self.min_samples_per_window) / elapsed).floor();

        self.last_estimated_fps = Some(fps);
        self.sample_count = 0;
        self.window_start = None;

        Some(fps)
    }

    pub fn last_estimated_fps(&self) -> Option<f64> {
        self.last_estimated_fps
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn window_start(&self) -> Option<f64> {
        self.window_start
    }

    pub fn min_samples_per_window(&self) -> u32 {
        self.min_samples_per_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(state: &mut SamplingState, frames: u32, period_ms: f64) -> Vec<f64> {
        (0..frames)
            .filter_map(|i| state.record_frame(1000.0 + f64::from(i) * period_ms))
            .collect()
    }

    #[test]
    fn first_frame_opens_window() {
        let mut s = SamplingState::new(10);
        assert_eq!(s.window_start(), None);
        assert_eq!(s.record_frame(42.5), None);
        assert_eq!(s.window_start(), Some(42.5));
        assert_eq!(s.sample_count(), 1);
    }

    #[test]
    fn window_closes_after_min_samples_plus_one() {
        let mut s = SamplingState::new(100);
        let estimates = feed(&mut s, 100, 16.6667);
        assert!(estimates.is_empty());
        assert_eq!(s.last_estimated_fps(), None);

        let fps = s.record_frame(1000.0 + 100.0 * 16.6667).unwrap();
        assert_eq!(fps, 59.0);
        assert_eq!(s.last_estimated_fps(), Some(59.0));
    }

    #[test]
    fn closing_a_window_starts_a_fresh_one() {
        let mut s = SamplingState::new(4);
        let estimates = feed(&mut s, 5, 10.0);
        assert_eq!(estimates, vec![100.0]);
        assert_eq!(s.sample_count(), 0);
        assert_eq!(s.window_start(), None);

        s.record_frame(5000.0);
        assert_eq!(s.window_start(), Some(5000.0));
    }

    #[test]
    fn later_windows_replace_the_estimate() {
        let mut s = SamplingState::new(2);
        s.record_frame(0.0);
        s.record_frame(10.0);
        assert_eq!(s.record_frame(20.0), Some(100.0));

        s.record_frame(100.0);
        s.record_frame(125.0);
        assert_eq!(s.record_frame(150.0), Some(40.0));
        assert_eq!(s.last_estimated_fps(), Some(40.0));
    }

    #[test]
    fn frozen_clock_yields_non_finite_estimate() {
        let mut s = SamplingState::new(1);
        s.record_frame(7.0);
        let fps = s.record_frame(7.0).unwrap();
        assert!(!fps.is_finite());
    }

    #[test]
    fn reset_clears_window_and_estimate() {
        let mut s = SamplingState::new(1);
        s.record_frame(0.0);
        s.record_frame(16.0);
        s.record_frame(32.0);
        assert!(s.last_estimated_fps().is_some());

        s.reset();
        assert_eq!(s.last_estimated_fps(), None);
        assert_eq!(s.window_start(), None);
        assert_eq!(s.sample_count(), 0);
        assert_eq!(s.min_samples_per_window(), 1);
    }
}
