//! Read-only engine diagnostics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Internal diagnostic counters, updated with relaxed atomics off the hot
/// path's critical sections.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub orders_processed: AtomicU64,
    pub trades_processed: AtomicU64,
    pub cancels_processed: AtomicU64,
    pub malformed_events: AtomicU64,
    pub actions_emitted: AtomicU64,
    pub actions_deduplicated: AtomicU64,
    pub latch_transitions: AtomicU64,
    pub sink_failures: AtomicU64,
    pub invariant_alerts: AtomicU64,
    pub ticks: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> Diagnostics {
        Diagnostics {
            orders_processed: self.orders_processed.load(Ordering::Relaxed),
            trades_processed: self.trades_processed.load(Ordering::Relaxed),
            cancels_processed: self.cancels_processed.load(Ordering::Relaxed),
            malformed_events: self.malformed_events.load(Ordering::Relaxed),
            actions_emitted: self.actions_emitted.load(Ordering::Relaxed),
            actions_deduplicated: self.actions_deduplicated.load(Ordering::Relaxed),
            latch_transitions: self.latch_transitions.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            invariant_alerts: self.invariant_alerts.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the engine's diagnostic counters.
///
/// Nothing in the engine depends on these values; they exist for operators
/// and tests. Counts are monotonically non-decreasing for the lifetime of
/// the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Orders accepted into the pipeline.
    pub orders_processed: u64,
    /// Trades accepted into the pipeline.
    pub trades_processed: u64,
    /// Cancels accepted into the pipeline.
    pub cancels_processed: u64,
    /// Events rejected at boundary validation.
    pub malformed_events: u64,
    /// Actions forwarded to the sink.
    pub actions_emitted: u64,
    /// Latched actions dropped as redundant.
    pub actions_deduplicated: u64,
    /// Latch state transitions (both directions).
    pub latch_transitions: u64,
    /// Sink callbacks that panicked.
    pub sink_failures: u64,
    /// Internal invariant alerts raised.
    pub invariant_alerts: u64,
    /// `tick` calls served.
    pub ticks: u64,
}

impl Diagnostics {
    /// Total events accepted across all kinds.
    #[must_use]
    pub const fn events_processed(&self) -> u64 {
        self.orders_processed + self.trades_processed + self.cancels_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = Counters::default();
        Counters::bump(&counters.orders_processed);
        Counters::bump(&counters.orders_processed);
        Counters::bump(&counters.actions_emitted);

        let diag = counters.snapshot();
        assert_eq!(diag.orders_processed, 2);
        assert_eq!(diag.actions_emitted, 1);
        assert_eq!(diag.events_processed(), 2);
    }
}
