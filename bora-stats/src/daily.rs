//! Daily multi-dimensional aggregates.
//!
//! Aggregates key on `(DimensionKey, DayId)`. A new UTC day therefore starts
//! from fresh zero-valued entries without any explicit rollover step;
//! old-day entries simply stop being addressed and are reclaimed at the
//! next snapshot/restore cycle.

use bora_core::dimensions::DimensionKey;
use bora_core::metrics::MetricKind;
use bora_core::types::{DayId, Nanos};

use crate::sharded::{Fnv1a, ShardKey, ShardedMetricMap};

/// Composite key of the daily statistics store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DayKey {
    /// The dimension tuple the aggregate is partitioned by.
    pub dimensions: DimensionKey,
    /// The UTC day the aggregate belongs to.
    pub day: DayId,
}

impl ShardKey for DayKey {
    fn shard_hash(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        self.dimensions.visit_bytes(|bytes| hasher.write(bytes));
        hasher.write(&self.day.as_u32().to_le_bytes());
        hasher.finish()
    }
}

/// Daily multi-dimensional metric accumulator over a [`ShardedMetricMap`].
///
/// # Examples
///
/// ```
/// use bora_core::dimensions::DimensionKey;
/// use bora_core::metrics::MetricKind;
/// use bora_core::types::{AccountId, Nanos};
/// use bora_stats::DailyStats;
///
/// let stats = DailyStats::new(64);
/// let key = DimensionKey {
///     account: Some(AccountId::new_unchecked("A")),
///     ..DimensionKey::empty()
/// };
/// let ts = Nanos::new(1_700_000_000_000_000_000);
/// let total = stats.add(&key, MetricKind::TradeVolume, 150.0, ts);
/// assert_eq!(total, 150.0);
/// ```
#[derive(Debug)]
pub struct DailyStats {
    map: ShardedMetricMap<DayKey>,
}

impl DailyStats {
    /// Creates a daily store with the given shard count (rounded up to a
    /// power of two).
    #[must_use]
    pub fn new(num_shards: usize) -> Self {
        Self {
            map: ShardedMetricMap::new(num_shards),
        }
    }

    /// Adds `value` to (key, metric) for the day containing `ts` and
    /// returns the new daily aggregate.
    pub fn add(&self, key: &DimensionKey, metric: MetricKind, value: f64, ts: Nanos) -> f64 {
        let day_key = DayKey {
            dimensions: key.clone(),
            day: ts.day_id(),
        };
        self.map.accumulate(&day_key, metric, value)
    }

    /// Returns the aggregate at (key, metric) for the day containing `ts`,
    /// or `0.0` if the key has not been seen that day.
    #[must_use]
    pub fn get(&self, key: &DimensionKey, metric: MetricKind, ts: Nanos) -> f64 {
        let day_key = DayKey {
            dimensions: key.clone(),
            day: ts.day_id(),
        };
        self.map.get(&day_key, metric)
    }

    /// Restores one aggregate entry for an explicit day.
    ///
    /// Used when absorbing a snapshot; adds on top of whatever is present so
    /// restore into a fresh store reproduces the snapshot exactly.
    pub fn absorb(&self, key: &DimensionKey, day: DayId, metric: MetricKind, value: f64) {
        let day_key = DayKey {
            dimensions: key.clone(),
            day,
        };
        self.map.accumulate(&day_key, metric, value);
    }

    /// Visits every non-zero (dimensions, day, metric, value) entry.
    pub fn for_each<F: FnMut(&DimensionKey, DayId, MetricKind, f64)>(&self, mut visit: F) {
        self.map
            .for_each(|day_key, metric, value| visit(&day_key.dimensions, day_key.day, metric, value));
    }

    /// Returns the number of live (dimensions, day) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if nothing has been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bora_core::types::AccountId;

    const NANOS_PER_DAY: u64 = 86_400_000_000_000;

    fn account_key(name: &str) -> DimensionKey {
        DimensionKey {
            account: Some(AccountId::new_unchecked(name)),
            ..DimensionKey::empty()
        }
    }

    #[test]
    fn test_add_accumulates_within_day() {
        let stats = DailyStats::new(8);
        let key = account_key("A");
        let ts = Nanos::new(1_700_000_000_000_000_000);

        assert_eq!(stats.add(&key, MetricKind::TradeVolume, 150.0, ts), 150.0);
        let later = ts.saturating_add(1_000_000);
        assert_eq!(stats.add(&key, MetricKind::TradeVolume, 150.0, later), 300.0);
        assert_eq!(stats.get(&key, MetricKind::TradeVolume, later), 300.0);
    }

    #[test]
    fn test_day_rollover_starts_fresh() {
        let stats = DailyStats::new(8);
        let key = account_key("A");
        let day = 19_675_u64;
        let before = Nanos::new(day * NANOS_PER_DAY + NANOS_PER_DAY - 1);
        let after = Nanos::new((day + 1) * NANOS_PER_DAY);

        stats.add(&key, MetricKind::TradeVolume, 900.0, before);
        assert_eq!(stats.get(&key, MetricKind::TradeVolume, before), 900.0);
        assert_eq!(stats.get(&key, MetricKind::TradeVolume, after), 0.0);

        stats.add(&key, MetricKind::TradeVolume, 200.0, after);
        assert_eq!(stats.get(&key, MetricKind::TradeVolume, after), 200.0);
        // The prior day's aggregate is untouched.
        assert_eq!(stats.get(&key, MetricKind::TradeVolume, before), 900.0);
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let stats = DailyStats::new(8);
        let ts = Nanos::new(1_700_000_000_000_000_000);
        stats.add(&account_key("A"), MetricKind::TradeVolume, 100.0, ts);
        stats.add(&account_key("B"), MetricKind::TradeVolume, 50.0, ts);

        assert_eq!(stats.get(&account_key("A"), MetricKind::TradeVolume, ts), 100.0);
        assert_eq!(stats.get(&account_key("B"), MetricKind::TradeVolume, ts), 50.0);
    }

    #[test]
    fn test_absorb_and_for_each_roundtrip() {
        let stats = DailyStats::new(8);
        let key = account_key("A");
        let ts = Nanos::new(1_700_000_000_000_000_000);
        stats.add(&key, MetricKind::TradeVolume, 900.0, ts);
        stats.add(&key, MetricKind::TradeNotional, 90_000.0, ts);

        let restored = DailyStats::new(8);
        stats.for_each(|dims, day, metric, value| restored.absorb(dims, day, metric, value));

        assert_eq!(restored.get(&key, MetricKind::TradeVolume, ts), 900.0);
        assert_eq!(restored.get(&key, MetricKind::TradeNotional, ts), 90_000.0);
        assert_eq!(restored.len(), stats.len());
    }
}
