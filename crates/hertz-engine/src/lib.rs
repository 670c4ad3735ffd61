//! Hertz engine crate.
//!
//! Estimates a display's refresh rate by counting frame callbacks from a
//! host scheduler and classifying the observed rate against a bucket table.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`estimator`] | `RefreshRateEstimator`, the async `estimate_hz` query |
//! | [`sampling`] | `SamplingState`, the per-window accumulator |
//! | [`buckets`] | `HertzBucket`, `HertzBuckets`, `classify` |
//! | [`scheduler`] | `FrameScheduler` seam, `PacedScheduler`, `ManualScheduler` |
//! | [`config`] | `EstimatorConfig` |
//! | [`error`] | `HertzError` |
//! | [`logging`] | `init_logging` |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use hertz_engine::{PacedScheduler, RefreshRateEstimator};
//!
//! # async fn run() -> Result<(), hertz_engine::HertzError> {
//! let estimator = RefreshRateEstimator::new(PacedScheduler::from_hz(60.0)?)?;
//! let hz = estimator.estimate_hz().await?;
//! println!("{hz}hz.");
//! # Ok(())
//! # }
//! ```

pub mod buckets;
pub mod config;
pub mod error;
pub mod estimator;
pub mod sampling;
pub mod scheduler;

pub mod logging;

pub use buckets::{classify, HertzBucket, HertzBuckets};
pub use config::EstimatorConfig;
pub use error::HertzError;
pub use estimator::RefreshRateEstimator;
pub use scheduler::{FrameCallback, FrameHandle, FrameScheduler, ManualScheduler, PacedScheduler};
