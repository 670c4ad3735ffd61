//! Hertz bucket table and classification.
//!
//! A bucket `(hz, min_fps)` says "a measured rate of at least `min_fps` is
//! reported as `hz`". Classification picks the bucket with the greatest
//! `min_fps` that the sample still reaches, so adding buckets only ever
//! tightens the lower bound and never switches to nearest-match.

use crate::error::HertzError;

/// One entry of the lookup table.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HertzBucket {
    pub hz: u32,
    pub min_fps: f64,
}

impl HertzBucket {
    pub const fn new(hz: u32, min_fps: f64) -> Self {
        Self { hz, min_fps }
    }
}

const DEFAULT_BUCKETS: [HertzBucket; 2] = [HertzBucket::new(60, 50.0), HertzBucket::new(144, 134.0)];

/// Validated bucket table, sorted strictly ascending by `min_fps`.
#[derive(Debug, Clone, PartialEq)]
pub struct HertzBuckets {
    buckets: Vec<HertzBucket>,
}

impl HertzBuckets {
    /// Builds a table, rejecting anything that breaks the ordering invariant.
    ///
    /// The input must already be in ascending `min_fps` order; it is not
    /// sorted on the caller's behalf so that a typo in a custom table fails
    /// loudly instead of silently reshuffling.
    pub fn new(buckets: Vec<HertzBucket>) -> Result<Self, HertzError> {
        if buckets.is_empty() {
            return Err(HertzError::config("bucket table must not be empty"));
        }

        for (i, bucket) in buckets.iter().enumerate() {
            if bucket.hz == 0 {
                return Err(HertzError::config(format!("bucket {i} has hz = 0")));
            }
            if !bucket.min_fps.is_finite() || bucket.min_fps <= 0.0 {
                return Err(HertzError::config(format!(
                    "bucket {i} has invalid min_fps {}",
                    bucket.min_fps
                )));
            }
            if buckets[..i].iter().any(|b| b.hz == bucket.hz) {
                return Err(HertzError::config(format!("duplicate bucket for {}hz", bucket.hz)));
            }
        }

        if let Some(pair) = buckets.windows(2).find(|w| w[0].min_fps >= w[1].min_fps) {
            return Err(HertzError::config(format!(
                "buckets must be strictly ascending by min_fps ({}hz@{} precedes {}hz@{})",
                pair[0].hz, pair[0].min_fps, pair[1].hz, pair[1].min_fps
            )));
        }

        Ok(Self { buckets })
    }

    pub fn as_slice(&self) -> &[HertzBucket] {
        &self.buckets
    }

    /// Lowest `min_fps` any measurement must reach to be classified.
    pub fn floor_fps(&self) -> f64 {
        self.buckets[0].min_fps
    }

    /// Maps a frames-per-second estimate to a refresh rate in hertz.
    pub fn classify(&self, fps: f64) -> Result<u32, HertzError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(HertzError::InvalidSampleRate { fps });
        }
        if fps < self.floor_fps() {
            return Err(HertzError::NoMatchingBucket { fps });
        }

        self.buckets
            .iter()
            .rev()
            .find(|b| fps >= b.min_fps)
            .map(|b| b.hz)
            .ok_or(HertzError::NoMatchingBucket { fps })
    }
}

impl Default for HertzBuckets {
    fn default() -> Self {
        Self { buckets: DEFAULT_BUCKETS.to_vec() }
    }
}

/// Classifies against the default 60/144 table.
pub fn classify(fps: f64) -> Result<u32, HertzError> {
    HertzBuckets::default().classify(fps)
}
