//! Engine construction parameters.

use serde::{Deserialize, Serialize};

use bora_core::catalog::InstrumentCatalog;

/// Construction-time configuration for [`crate::RiskEngine`].
///
/// # Examples
///
/// ```
/// use bora_core::catalog::InstrumentCatalog;
/// use bora_engine::EngineConfig;
///
/// let config = EngineConfig::new()
///     .with_shards(128)
///     .with_window_buckets(256)
///     .with_catalog(InstrumentCatalog::builder().product("T2303", "T10Y").build());
/// assert_eq!(config.num_shards, 128);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Shard count for the daily statistics store; rounded up to a power of
    /// two at construction.
    pub num_shards: usize,
    /// Default bucket count for rate-limit rolling windows.
    pub window_buckets: usize,
    /// Capacity of the order enrichment index.
    pub order_index_capacity: usize,
    /// Instrument reference data.
    #[serde(default)]
    pub catalog: InstrumentCatalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_shards: bora_stats::DEFAULT_SHARDS,
            window_buckets: bora_stats::DEFAULT_WINDOW_BUCKETS,
            order_index_capacity: 100_000,
            catalog: InstrumentCatalog::new(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the statistics shard count.
    #[must_use]
    pub fn with_shards(mut self, num_shards: usize) -> Self {
        self.num_shards = num_shards;
        self
    }

    /// Sets the default rolling-window bucket count.
    #[must_use]
    pub fn with_window_buckets(mut self, buckets: usize) -> Self {
        self.window_buckets = buckets;
        self
    }

    /// Sets the order index capacity.
    #[must_use]
    pub fn with_order_index_capacity(mut self, capacity: usize) -> Self {
        self.order_index_capacity = capacity;
        self
    }

    /// Sets the instrument catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: InstrumentCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.num_shards, 64);
        assert_eq!(config.window_buckets, 128);
        assert_eq!(config.order_index_capacity, 100_000);
        assert!(config.catalog.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_shards(32)
            .with_window_buckets(512)
            .with_order_index_capacity(10);
        assert_eq!(config.num_shards, 32);
        assert_eq!(config.window_buckets, 512);
        assert_eq!(config.order_index_capacity, 10);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = EngineConfig::new().with_shards(16);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.num_shards, 16);
    }
}
