//! Refresh-rate estimator.
//!
//! The measurement loop is a chain of frame callbacks: every callback records
//! one sample and schedules the next one. A query starts the chain, polls for
//! the first finished window, stops the chain, and classifies the result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::EstimatorConfig;
use crate::error::HertzError;
use crate::sampling::SamplingState;
use crate::scheduler::FrameScheduler;

/// Estimates the display refresh rate from frame-callback cadence.
///
/// One query may run at a time per instance. Instances are independent: each
/// owns its sampling state and its pending frame handle.
pub struct RefreshRateEstimator<S: FrameScheduler> {
    inner: Arc<Inner<S>>,
}

struct Inner<S: FrameScheduler> {
    scheduler: S,
    config: EstimatorConfig,
    state: Mutex<SamplingState>,
    monitoring: AtomicBool,
}

impl<S: FrameScheduler> RefreshRateEstimator<S> {
    /// Estimator with the default configuration.
    pub fn new(scheduler: S) -> Result<Self, HertzError> {
        Self::with_config(scheduler, EstimatorConfig::default())
    }

    /// Estimator averaging `min_samples_per_window` frame intervals per estimate.
    pub fn with_min_samples(scheduler: S, min_samples_per_window: u32) -> Result<Self, HertzError> {
        Self::with_config(scheduler, EstimatorConfig::with_min_samples(min_samples_per_window))
    }

    pub fn with_config(scheduler: S, config: EstimatorConfig) -> Result<Self, HertzError> {
        config.validate()?;
        let state = SamplingState::new(config.min_samples_per_window);

        Ok(Self {
            inner: Arc::new(Inner {
                scheduler,
                config,
                state: Mutex::new(state),
                monitoring: AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.inner.config
    }

    pub fn scheduler(&self) -> &S {
        &self.inner.scheduler
    }

    /// Whether a query is currently in flight.
    pub fn is_monitoring(&self) -> bool {
        self.inner.monitoring.load(Ordering::Acquire)
    }

    /// Classifies `fps` against this estimator's bucket table.
    pub fn classify(&self, fps: f64) -> Result<u32, HertzError> {
        self.inner.config.buckets.classify(fps)
    }

    /// Cancels the pending frame callback, if any.
    ///
    /// Safe to call at any time and any number of times.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Measures frame cadence and returns the classified refresh rate.
    ///
    /// Sampling restarts from scratch on every call. The loop is stopped on
    /// every exit path, including the returned future being dropped.
    pub async fn estimate_hz(&self) -> Result<u32, HertzError> {
        let session = MonitorSession::begin(&self.inner)?;
        self.inner.start();

        let timeout = self.inner.config.timeout;
        let fps = match tokio::time::timeout(timeout, self.inner.wait_for_estimate()).await {
            Ok(fps) => fps,
            Err(_) => {
                log::warn!("no refresh-rate estimate within {timeout:?}");
                return Err(HertzError::MonitoringTimedOut { timeout });
            }
        };

        // Stop sampling before classifying; a rejected sample is still final.
        drop(session);

        let hz = self.classify(fps).inspect_err(|e| log::debug!("classification failed: {e}"))?;
        log::info!("measured {fps}fps, classified as {hz}hz");
        Ok(hz)
    }
}

impl<S: FrameScheduler> Drop for RefreshRateEstimator<S> {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

impl<S: FrameScheduler> Inner<S> {
    /// Resets sampling and arms the first frame callback of a new loop.
    fn start(self: &Arc<Self>) {
        let generation = {
            let mut state = self.state.lock();
            state.reset();
            state.loops_started += 1;
            state.active_loop = Some(state.loops_started);
            state.loops_started
        };

        log::debug!(
            "measurement loop {generation} started (window = {} frames)",
            self.config.min_samples_per_window
        );
        self.arm(generation);
    }

    /// Schedules the next loop step for `generation`.
    ///
    /// The scheduler is called without holding the state lock. If the loop
    /// was stopped or replaced in the meantime the fresh handle is cancelled
    /// immediately.
    fn arm(self: &Arc<Self>, generation: u64) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = self.scheduler.schedule_next_frame(Box::new(move |timestamp: f64| {
            if let Some(inner) = weak.upgrade() {
                inner.step(generation, timestamp);
            }
        }));

        let mut state = self.state.lock();
        if state.active_loop == Some(generation) {
            state.pending = Some(handle);
        } else {
            drop(state);
            self.scheduler.cancel_scheduled_frame(handle);
        }
    }

    /// One measurement-loop step. Never fails; a bad sample only shows up
    /// when the estimate is classified.
    fn step(self: &Arc<Self>, generation: u64, timestamp: f64) {
        {
            let mut state = self.state.lock();
            if state.active_loop != Some(generation) {
                return;
            }
            state.pending = None;

            if let Some(fps) = state.record_frame(timestamp) {
                log::debug!("measurement loop {generation}: window closed at {timestamp:.3}ms, {fps}fps");
            }
        }

        self.arm(generation);
    }

    fn stop(&self) {
        let pending = {
            let mut state = self.state.lock();
            if let Some(generation) = state.active_loop.take() {
                log::debug!("measurement loop {generation} stopped");
            }
            state.pending.take()
        };

        if let Some(handle) = pending {
            self.scheduler.cancel_scheduled_frame(handle);
        }
    }

    async fn wait_for_estimate(&self) -> f64 {
        loop {
            let ready = self.state.lock().last_estimated_fps();
            if let Some(fps) = ready {
                return fps;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

/// Marks a query as in flight; stops the loop and clears the mark on drop.
struct MonitorSession<'a, S: FrameScheduler> {
    inner: &'a Inner<S>,
}

impl<'a, S: FrameScheduler> MonitorSession<'a, S> {
    fn begin(inner: &'a Inner<S>) -> Result<Self, HertzError> {
        inner
            .monitoring
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HertzError::AlreadyMonitoring)?;
        Ok(Self { inner })
    }
}

impl<S: FrameScheduler> Drop for MonitorSession<'_, S> {
    fn drop(&mut self) {
        self.inner.stop();
        self.inner.monitoring.store(false, Ordering::Release);
    }
}
