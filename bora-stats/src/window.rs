//! Lock-free fixed-bucket sliding-window counter.
//!
//! The ring covers a window of width W split into B fixed buckets of width
//! W/B. Each bucket is a `(start, count)` atomic pair. Incrementing at
//! timestamp `t` lands in bucket `(t / (W/B)) mod B`; a bucket whose stored
//! start no longer matches the computed start is reset before the increment.
//! The window sum walks all B buckets and counts those whose start lies in
//! `[t − W + 1, t]`, so the reported sum over-approximates the true count by
//! at most one bucket width.

use std::sync::atomic::{AtomicU64, Ordering};

use bora_core::types::Nanos;

/// Valid bucket-count range for a rolling window.
const BUCKET_RANGE: std::ops::RangeInclusive<usize> = 64..=1024;

/// Rolling-window configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// Bucket count outside the supported range.
    #[error("bucket count {0} outside supported range [64, 1024]")]
    InvalidBucketCount(usize),

    /// Window too narrow for the bucket count (bucket width would be zero).
    #[error("window of {window_ns}ns cannot be split into {buckets} buckets")]
    WindowTooNarrow {
        /// Requested window width in nanoseconds.
        window_ns: u64,
        /// Requested bucket count.
        buckets: usize,
    },

    /// Window width of zero.
    #[error("window width must be positive")]
    ZeroWindow,
}

#[derive(Debug)]
struct Bucket {
    start: AtomicU64,
    count: AtomicU64,
}

impl Bucket {
    fn new() -> Self {
        Self {
            // u64::MAX marks a never-written bucket; no valid start collides
            // with it because starts are multiples of the bucket width.
            start: AtomicU64::new(u64::MAX),
            count: AtomicU64::new(0),
        }
    }
}

/// Pre-validated window geometry.
///
/// Rate-limit rules create one ring per live key; validating the geometry
/// once up front makes the per-key construction infallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    window_ns: u64,
    buckets: usize,
}

impl WindowSpec {
    /// Validates a window of `window_ns` nanoseconds over `buckets` buckets.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RollingWindow::new`].
    pub fn new(window_ns: u64, buckets: usize) -> Result<Self, WindowError> {
        if window_ns == 0 {
            return Err(WindowError::ZeroWindow);
        }
        if !BUCKET_RANGE.contains(&buckets) {
            return Err(WindowError::InvalidBucketCount(buckets));
        }
        if window_ns / buckets as u64 == 0 {
            return Err(WindowError::WindowTooNarrow { window_ns, buckets });
        }
        Ok(Self { window_ns, buckets })
    }

    /// Returns the window width in nanoseconds.
    #[must_use]
    pub const fn window_ns(&self) -> u64 {
        self.window_ns
    }

    /// Returns the bucket count.
    #[must_use]
    pub const fn buckets(&self) -> usize {
        self.buckets
    }

    /// Builds a fresh ring with this geometry.
    #[must_use]
    pub fn build(&self) -> RollingWindow {
        let bucket_ns = self.window_ns / self.buckets as u64;
        let buckets = (0..self.buckets)
            .map(|_| Bucket::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        RollingWindow {
            window_ns: self.window_ns,
            bucket_ns,
            buckets,
        }
    }
}

/// Fixed-bucket ring counting events inside a sliding window.
///
/// Free-threaded: increments and sums may race, with the documented
/// one-bucket-width approximation as the only imprecision. There is no lock
/// anywhere on this path.
///
/// # Examples
///
/// ```
/// use bora_core::types::Nanos;
/// use bora_stats::RollingWindow;
///
/// let window = RollingWindow::new(1_000_000_000, 100).unwrap();
/// let t0 = Nanos::new(1_700_000_000_000_000_000);
/// assert_eq!(window.increment(t0), 1);
/// assert_eq!(window.increment(t0.saturating_add(5_000_000)), 2);
/// ```
#[derive(Debug)]
pub struct RollingWindow {
    window_ns: u64,
    bucket_ns: u64,
    buckets: Box<[Bucket]>,
}

impl RollingWindow {
    /// Creates a window of `window_ns` nanoseconds split into `num_buckets`
    /// buckets.
    ///
    /// # Errors
    ///
    /// Returns a `WindowError` when the bucket count is outside [64, 1024],
    /// the window is zero, or the window is narrower than the bucket count.
    pub fn new(window_ns: u64, num_buckets: usize) -> Result<Self, WindowError> {
        Ok(WindowSpec::new(window_ns, num_buckets)?.build())
    }

    /// Returns the window width in nanoseconds.
    #[must_use]
    pub const fn window_ns(&self) -> u64 {
        self.window_ns
    }

    /// Returns the bucket width in nanoseconds.
    #[must_use]
    pub const fn bucket_ns(&self) -> u64 {
        self.bucket_ns
    }

    /// Returns the number of buckets.
    #[must_use]
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn slot(&self, ts: u64) -> (&Bucket, u64) {
        let index = ((ts / self.bucket_ns) % self.buckets.len() as u64) as usize;
        let start = ts - ts % self.bucket_ns;
        (&self.buckets[index], start)
    }

    /// Counts one event at `ts` and returns the current window sum.
    ///
    /// An event whose bucket slot has been reused for a newer interval
    /// resets the slot to the event's own interval first; out-of-order
    /// events within a still-live bucket accumulate normally.
    pub fn increment(&self, ts: Nanos) -> u64 {
        let ts = ts.as_nanos();
        let (bucket, start) = self.slot(ts);
        if bucket.start.load(Ordering::Acquire) != start {
            bucket.count.store(0, Ordering::Release);
            bucket.start.store(start, Ordering::Release);
        }
        bucket.count.fetch_add(1, Ordering::AcqRel);
        self.sum_at(ts)
    }

    /// Returns the window sum observed at `ts` without counting anything.
    #[must_use]
    pub fn sum(&self, ts: Nanos) -> u64 {
        self.sum_at(ts.as_nanos())
    }

    fn sum_at(&self, ts: u64) -> u64 {
        let lower = ts.saturating_sub(self.window_ns - 1);
        let mut total = 0_u64;
        for bucket in &self.buckets {
            let start = bucket.start.load(Ordering::Acquire);
            if start >= lower && start <= ts {
                total += bucket.count.load(Ordering::Acquire);
            }
        }
        total
    }
}
