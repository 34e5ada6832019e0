//! Lock-striped concurrent metric map.
//!
//! Keys route to one of N shards (N a power of two) by FNV-1a hash. Each
//! shard guards its key table with an independent `RwLock`; the per-key
//! accumulators are plain atomics, so the common accumulate path takes the
//! shard lock in read mode only. Inserting a previously unseen key upgrades
//! to the write lock once.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bora_core::metrics::MetricKind;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Incremental FNV-1a 64-bit hasher used for shard routing.
///
/// # Examples
///
/// ```
/// use bora_stats::Fnv1a;
///
/// let mut hasher = Fnv1a::new();
/// hasher.write(b"ACC_001");
/// let h = hasher.finish();
/// assert_ne!(h, Fnv1a::new().finish());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a(u64);

impl Fnv1a {
    /// Creates a hasher seeded with the FNV offset basis.
    #[must_use]
    pub const fn new() -> Self {
        Self(FNV_OFFSET)
    }

    /// Feeds bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(FNV_PRIME);
        }
        self.0 = h;
    }

    /// Returns the accumulated hash value.
    #[must_use]
    pub const fn finish(&self) -> u64 {
        self.0
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

/// A key that knows its own shard-routing hash.
pub trait ShardKey: Eq + Hash + Clone {
    /// Returns a stable 64-bit hash of the key for shard routing.
    fn shard_hash(&self) -> u64;
}

/// Per-key accumulator cells, one atomic scalar per [`MetricKind`].
///
/// Scalars hold `f64` bit patterns; accumulation is a CAS loop so each
/// addition is observed exactly once regardless of contention.
#[derive(Debug)]
pub struct MetricCells {
    cells: [AtomicU64; MetricKind::ALL.len()],
}

impl MetricCells {
    fn new() -> Self {
        Self {
            cells: std::array::from_fn(|_| AtomicU64::new(0.0_f64.to_bits())),
        }
    }

    /// Adds `delta` to the accumulator for `metric`, returning the
    /// post-addition value.
    pub fn accumulate(&self, metric: MetricKind, delta: f64) -> f64 {
        let cell = &self.cells[metric.slot()];
        let mut current = cell.load(Ordering::Acquire);
        loop {
            let next = f64::from_bits(current) + delta;
            match cell.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Returns the current value for `metric`.
    #[must_use]
    pub fn get(&self, metric: MetricKind) -> f64 {
        f64::from_bits(self.cells[metric.slot()].load(Ordering::Acquire))
    }
}

/// Concurrent mapping from a composite key to per-metric accumulators,
/// partitioned into independently locked shards.
///
/// Guarantees:
/// - concurrent accumulates on the same (key, metric) linearize and produce
///   exactly-once addition,
/// - accumulates on keys in different shards never serialize,
/// - inserting a new key blocks only its own shard, briefly.
#[derive(Debug)]
pub struct ShardedMetricMap<K: ShardKey> {
    shards: Box<[RwLock<HashMap<K, Arc<MetricCells>>>]>,
    mask: u64,
}

impl<K: ShardKey> ShardedMetricMap<K> {
    /// Creates a map with `num_shards` shards, rounded up to the next power
    /// of two (minimum 1).
    #[must_use]
    pub fn new(num_shards: usize) -> Self {
        let n = num_shards.max(1).next_power_of_two();
        let shards = (0..n)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            shards,
            mask: (n - 1) as u64,
        }
    }

    /// Returns the shard count.
    #[must_use]
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn shard_of(&self, key: &K) -> &RwLock<HashMap<K, Arc<MetricCells>>> {
        &self.shards[(key.shard_hash() & self.mask) as usize]
    }

    /// Returns the accumulator table for `key`, creating it on first access.
    pub fn entry(&self, key: &K) -> Arc<MetricCells> {
        let shard = self.shard_of(key);
        {
            let guard = shard.read();
            if let Some(cells) = guard.get(key) {
                return Arc::clone(cells);
            }
        }
        let mut guard = shard.write();
        Arc::clone(
            guard
                .entry(key.clone())
                .or_insert_with(|| Arc::new(MetricCells::new())),
        )
    }

    /// Adds `delta` to (key, metric), creating the key as needed, and
    /// returns the post-addition value.
    pub fn accumulate(&self, key: &K, metric: MetricKind, delta: f64) -> f64 {
        self.entry(key).accumulate(metric, delta)
    }

    /// Returns the current value at (key, metric), or `0.0` when the key is
    /// unknown.
    #[must_use]
    pub fn get(&self, key: &K, metric: MetricKind) -> f64 {
        let shard = self.shard_of(key);
        let guard = shard.read();
        guard.get(key).map_or(0.0, |cells| cells.get(metric))
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    /// Returns true if no key has been touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.read().is_empty())
    }

    /// Visits every non-zero (key, metric, value) triple.
    ///
    /// Intended for snapshot export; takes each shard's read lock in turn,
    /// so concurrent accumulates proceed on other shards.
    pub fn for_each<F: FnMut(&K, MetricKind, f64)>(&self, mut visit: F) {
        for shard in &self.shards {
            let guard = shard.read();
            for (key, cells) in guard.iter() {
                for metric in MetricKind::ALL {
                    let value = cells.get(metric);
                    if value != 0.0 {
                        visit(key, metric, value);
                    }
                }
            }
        }
    }

    /// Removes every key, leaving the shard structure intact.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.write().clear();
        }
    }
}
