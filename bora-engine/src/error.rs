//! Engine error types.

use thiserror::Error;

use bora_core::metrics::MetricKind;
use bora_core::types::ValidationError;
use bora_stats::WindowError;

/// Errors raised by rule and engine configuration calls.
///
/// A failed configuration call never touches the active rule set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Threshold must be strictly positive.
    #[error("threshold must be positive, got {0}")]
    NonPositiveThreshold(f64),

    /// Threshold is NaN or infinite.
    #[error("threshold must be finite, got {0}")]
    NonFiniteThreshold(f64),

    /// A rule must aggregate over at least one dimension.
    #[error("rule {rule_id} selects no live dimensions")]
    EmptyDimensionMask {
        /// The offending rule.
        rule_id: String,
    },

    /// A rule must emit at least one action.
    #[error("rule {rule_id} configures no actions")]
    NoActions {
        /// The offending rule.
        rule_id: String,
    },

    /// The metric is not applicable to any event kind the rule accepts.
    #[error("rule {rule_id}: metric {metric} never applies to the configured event kinds")]
    InapplicableMetric {
        /// The offending rule.
        rule_id: String,
        /// The configured metric.
        metric: MetricKind,
    },

    /// Invalid rolling-window geometry.
    #[error("invalid window geometry: {0}")]
    Window(#[from] WindowError),

    /// A rule with this identifier is already registered.
    #[error("rule {0} is already registered")]
    DuplicateRule(String),

    /// No rule with this identifier is registered.
    #[error("rule {0} is not registered")]
    UnknownRule(String),

    /// The targeted rule exists but is of a different kind.
    #[error("rule {rule_id} is not a {expected} rule")]
    WrongRuleKind {
        /// The targeted rule.
        rule_id: String,
        /// The kind the mutator expected.
        expected: &'static str,
    },
}

/// Errors raised by snapshot encode/restore.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The blob does not start with the snapshot magic.
    #[error("bad snapshot magic")]
    BadMagic,

    /// The blob's version is not supported by this reader.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),

    /// The blob is shorter than its header or length prefix promises.
    #[error("truncated snapshot: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes promised by the header.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// Payload checksum mismatch.
    #[error("snapshot checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        expected: u32,
        /// Checksum of the payload as read.
        actual: u32,
    },

    /// The payload is not valid serialized state.
    #[error("malformed snapshot payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A section this reader does not understand is marked required.
    #[error("unknown required snapshot section {0:?}")]
    UnknownRequiredSection(String),

    /// A section this reader needs is missing.
    #[error("missing snapshot section {0:?}")]
    MissingSection(&'static str),
}

/// Top-level engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The event failed boundary validation; no state was mutated.
    #[error("malformed event: {0}")]
    Malformed(#[from] ValidationError),

    /// A configuration call failed; the previous rule set is intact.
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot encode/restore failed; on restore the engine is untouched.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NonPositiveThreshold(-5.0);
        assert!(err.to_string().contains("-5"));

        let err = ConfigError::DuplicateRule("RATE-50".to_string());
        assert!(err.to_string().contains("RATE-50"));
    }

    #[test]
    fn test_window_error_converts() {
        let err: ConfigError = WindowError::ZeroWindow.into();
        assert!(matches!(err, ConfigError::Window(WindowError::ZeroWindow)));
    }

    #[test]
    fn test_engine_error_from_validation() {
        let err: EngineError = ValidationError::InvalidPrice(f64::NAN).into();
        assert!(matches!(err, EngineError::Malformed(_)));
        assert!(err.to_string().contains("malformed event"));
    }

    #[test]
    fn test_snapshot_error_display() {
        let err = SnapshotError::ChecksumMismatch {
            expected: 0xdead_beef,
            actual: 0x1234_5678,
        };
        let msg = err.to_string();
        assert!(msg.contains("0xdeadbeef"));
        assert!(msg.contains("0x12345678"));
    }
}
