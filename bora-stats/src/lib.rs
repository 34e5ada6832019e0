//! # Bora Stats
//!
//! Concurrent statistics substrate for the Bora risk-control engine.
//!
//! This crate provides:
//! - [`ShardedMetricMap`] - lock-striped concurrent map from a composite key
//!   to per-metric atomic accumulators
//! - [`DailyStats`] - daily multi-dimensional aggregates keyed by
//!   (dimension key, UTC day)
//! - [`RollingWindow`] - lock-free fixed-bucket sliding-window counter
//! - [`OrderIndex`] - bounded order-id → dimensions mapping for trade and
//!   cancel enrichment
//!
//! All structures are free-threaded: any number of ingest threads may update
//! them concurrently. Updates to a single accumulator linearize; updates on
//! distinct shards proceed independently.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

mod daily;
mod order_index;
mod sharded;
mod window;

pub use daily::{DailyStats, DayKey};
pub use order_index::{OrderDims, OrderIndex};
pub use sharded::{Fnv1a, MetricCells, ShardKey, ShardedMetricMap};
pub use window::{RollingWindow, WindowError, WindowSpec};

/// Default shard count for the statistics substrate.
pub const DEFAULT_SHARDS: usize = 64;

/// Default bucket count for rolling-window counters.
pub const DEFAULT_WINDOW_BUCKETS: usize = 128;
