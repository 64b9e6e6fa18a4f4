//! Down-sampling query engine
//!
//! Aggregates the newest `bucket_count * bucket_width` readings of the history
//! into `bucket_count` mean buckets, newest last. The last bucket is always
//! re-derived from the tail of the history so a response ends with the
//! freshest signal, even when the history is shorter than one bucket.

use std::num::NonZeroUsize;

use crate::error::{Result, StationError};
use crate::reading::{Bucket, Reading};

pub const DEFAULT_BUCKET_COUNT: usize = 300;
pub const DEFAULT_BUCKET_WIDTH: usize = 1;

/// Validated query arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParams {
    pub bucket_count: NonZeroUsize,
    pub bucket_width: NonZeroUsize,
}

impl QueryParams {
    /// Validate raw caller arguments; both must be at least 1
    pub fn new(bucket_count: i64, bucket_width: i64) -> Result<Self> {
        Ok(Self {
            bucket_count: positive("readings", bucket_count)?,
            bucket_width: positive("interval", bucket_width)?,
        })
    }

    /// Number of raw readings the query asks for
    pub fn requested(&self) -> usize {
        self.bucket_count.get().saturating_mul(self.bucket_width.get())
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            bucket_count: NonZeroUsize::new(DEFAULT_BUCKET_COUNT).unwrap_or(NonZeroUsize::MIN),
            bucket_width: NonZeroUsize::new(DEFAULT_BUCKET_WIDTH).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

fn positive(name: &str, value: i64) -> Result<NonZeroUsize> {
    usize::try_from(value)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            StationError::InvalidArgument(format!("{} must be at least 1, got {}", name, value))
        })
}

/// Down-sample `readings` (oldest first) into mean buckets
pub fn downsample(readings: &[Reading], params: QueryParams) -> Vec<Bucket> {
    let n = readings.len();
    let width = params.bucket_width.get();
    let requested = params.requested();

    // Drop the oldest readings that cannot fill a whole bucket
    let span = if requested <= n { requested } else { n - n % width };

    // Full strides, stopping one stride short of the newest reading
    let mut buckets: Vec<Bucket> = (n - span..n.saturating_sub(width))
        .step_by(width)
        .filter_map(|start| aggregate(&readings[start..start + width]))
        .collect();

    let tail = if n > width { width } else { n };
    buckets.extend(aggregate(&readings[n - tail..]));
    buckets
}

/// Mean of one window; `None` for an empty window
fn aggregate(window: &[Reading]) -> Option<Bucket> {
    let last = window.last()?;
    let count = window.len() as f64;
    let (temperature, pressure) = window
        .iter()
        .fold((0.0, 0.0), |(t, p), r| (t + r.temperature, p + r.pressure));

    Some(Bucket {
        time: last.time,
        temperature: temperature / count,
        pressure: pressure / count,
    })
}
