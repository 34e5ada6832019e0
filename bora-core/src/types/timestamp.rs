//! Nanosecond timestamp and UTC day identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds per UTC day.
const NANOS_PER_DAY: u64 = 86_400_000_000_000;

/// Timestamp type - nanoseconds since Unix epoch.
///
/// The engine treats timestamps as opaque monotonic-per-source values; no
/// global ordering across sources is assumed.
///
/// # Examples
///
/// ```
/// use bora_core::types::Nanos;
///
/// let ts = Nanos::new(1_700_000_000_000_000_000);
/// assert_eq!(ts.as_nanos(), 1_700_000_000_000_000_000);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Nanos(u64);

impl Nanos {
    /// Zero timestamp constant.
    pub const ZERO: Self = Self(0);

    /// Creates a new `Nanos` from nanoseconds since Unix epoch.
    #[must_use]
    pub const fn new(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Creates a `Nanos` from whole seconds since Unix epoch.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000_000_000)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before Unix epoch");
        Self(duration.as_nanos() as u64)
    }

    /// Returns the timestamp as nanoseconds since Unix epoch.
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Returns the UTC day this timestamp falls in.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn day_id(&self) -> DayId {
        DayId((self.0 / NANOS_PER_DAY) as u32)
    }

    /// Returns the timestamp advanced by `nanos` nanoseconds (saturating).
    #[must_use]
    pub const fn saturating_add(&self, nanos: u64) -> Self {
        Self(self.0.saturating_add(nanos))
    }

    /// Returns the timestamp moved back by `nanos` nanoseconds (saturating).
    #[must_use]
    pub const fn saturating_sub(&self, nanos: u64) -> Self {
        Self(self.0.saturating_sub(nanos))
    }
}

impl fmt::Display for Nanos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Nanos {
    fn from(nanos: u64) -> Self {
        Self(nanos)
    }
}

impl From<Nanos> for u64 {
    fn from(ts: Nanos) -> Self {
        ts.0
    }
}

/// UTC day number - the timestamp divided by nanoseconds-per-day.
///
/// Daily statistics key on `(DimensionKey, DayId)`, so a new day implicitly
/// starts fresh zero-valued aggregates without any explicit reset step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct DayId(u32);

impl DayId {
    /// Creates a `DayId` from a raw day number.
    #[must_use]
    pub const fn new(day: u32) -> Self {
        Self(day)
    }

    /// Returns the raw day number.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nanos_day_id() {
        // 2023-11-14T22:13:20Z
        let ts = Nanos::new(1_700_000_000_000_000_000);
        assert_eq!(ts.day_id(), DayId::new(19_675));
    }

    #[test]
    fn test_day_id_boundary() {
        let day = 19_675_u64;
        let last_of_day = Nanos::new(day * NANOS_PER_DAY + NANOS_PER_DAY - 1);
        let first_of_next = Nanos::new((day + 1) * NANOS_PER_DAY);
        assert_eq!(last_of_day.day_id().as_u32(), 19_675);
        assert_eq!(first_of_next.day_id().as_u32(), 19_676);
    }

    #[test]
    fn test_nanos_from_secs() {
        let ts = Nanos::from_secs(1_700_000_000);
        assert_eq!(ts.as_nanos(), 1_700_000_000_000_000_000);
    }

    #[test]
    fn test_nanos_now_nonzero() {
        assert!(Nanos::now().as_nanos() > 0);
    }

    #[test]
    fn test_nanos_saturating_arithmetic() {
        let ts = Nanos::new(100);
        assert_eq!(ts.saturating_sub(200), Nanos::ZERO);
        assert_eq!(Nanos::new(u64::MAX).saturating_add(1).as_nanos(), u64::MAX);
    }
}
