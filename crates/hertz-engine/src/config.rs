use std::time::Duration;

use crate::buckets::HertzBuckets;
use crate::error::HertzError;

pub const ENV_MIN_SAMPLES: &str = "HERTZ_MIN_SAMPLES";
pub const ENV_POLL_INTERVAL_MS: &str = "HERTZ_POLL_INTERVAL_MS";
pub const ENV_TIMEOUT_MS: &str = "HERTZ_TIMEOUT_MS";

/// Estimator configuration.
///
/// `min_samples_per_window` is the number of frame intervals averaged into
/// one estimate. `poll_interval` is how often the query checks for a
/// finished window, and `timeout` bounds the whole query. `buckets` is
/// validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    pub min_samples_per_window: u32,
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub buckets: HertzBuckets,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_samples_per_window: 100,
            poll_interval: Duration::from_millis(50),
            timeout: Duration::from_secs(10),
            buckets: HertzBuckets::default(),
        }
    }
}

impl EstimatorConfig {
    pub fn with_min_samples(min_samples_per_window: u32) -> Self {
        Self { min_samples_per_window, ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), HertzError> {
        if self.min_samples_per_window == 0 {
            return Err(HertzError::config("min_samples_per_window must be a positive integer"));
        }
        if self.poll_interval.is_zero() {
            return Err(HertzError::config("poll_interval must be non-zero"));
        }
        if self.timeout.is_zero() {
            return Err(HertzError::config("timeout must be non-zero"));
        }
        Ok(())
    }

    /// Defaults overridden by `HERTZ_*` environment variables, if set.
    pub fn from_env() -> Result<Self, HertzError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, HertzError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MIN_SAMPLES) {
            config.min_samples_per_window = parse_positive(ENV_MIN_SAMPLES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll_interval = Duration::from_millis(parse_positive(ENV_POLL_INTERVAL_MS, &raw)?.into());
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout = Duration::from_millis(parse_positive(ENV_TIMEOUT_MS, &raw)?.into());
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parses a strictly positive integer, reporting negatives and zero as
/// configuration errors rather than parse failures.
pub fn parse_positive(name: &str, raw: &str) -> Result<u32, HertzError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|e| HertzError::config(format!("{name}={raw:?} is not an integer: {e}")))?;

    if value <= 0 {
        return Err(HertzError::config(format!("{name} must be a positive integer, got {value}")));
    }

    u32::try_from(value).map_err(|_| HertzError::config(format!("{name}={value} is out of range")))
}
