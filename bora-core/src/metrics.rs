//! Metric kinds accumulated by the statistics substrate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::events::{Cancel, EventRef, Order, Trade};

/// A scalar quantity accumulated per (dimension key, day).
///
/// The enumeration is closed but designed for extension: adding a kind means
/// adding a variant and a contribution arm, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Sum of traded volume.
    TradeVolume,
    /// Sum of price × volume over fills.
    TradeNotional,
    /// Number of fills.
    TradeCount,
    /// Number of order submissions.
    OrderCount,
    /// Number of cancel requests.
    CancelCount,
}

impl MetricKind {
    /// All metric kinds, in stable slot order.
    ///
    /// The statistics substrate indexes per-key accumulator slots by this
    /// order; keep it append-only.
    pub const ALL: [Self; 5] = [
        Self::TradeVolume,
        Self::TradeNotional,
        Self::TradeCount,
        Self::OrderCount,
        Self::CancelCount,
    ];

    /// Returns the accumulator slot index for this kind.
    #[must_use]
    pub const fn slot(&self) -> usize {
        match self {
            Self::TradeVolume => 0,
            Self::TradeNotional => 1,
            Self::TradeCount => 2,
            Self::OrderCount => 3,
            Self::CancelCount => 4,
        }
    }

    /// Returns true for metrics whose values are integer-exact counts.
    #[must_use]
    pub const fn is_integer_valued(&self) -> bool {
        !matches!(self, Self::TradeNotional)
    }

    /// Returns this metric's contribution for an order event, if any.
    #[must_use]
    pub fn order_contribution(&self, _order: &Order) -> Option<f64> {
        match self {
            Self::OrderCount => Some(1.0),
            _ => None,
        }
    }

    /// Returns this metric's contribution for a trade event, if any.
    #[must_use]
    pub fn trade_contribution(&self, trade: &Trade) -> Option<f64> {
        match self {
            Self::TradeVolume => Some(trade.volume.as_f64()),
            Self::TradeNotional => Some(trade.price.notional(trade.volume)),
            Self::TradeCount => Some(1.0),
            _ => None,
        }
    }

    /// Returns this metric's contribution for a cancel event, if any.
    #[must_use]
    pub fn cancel_contribution(&self, _cancel: &Cancel) -> Option<f64> {
        match self {
            Self::CancelCount => Some(1.0),
            _ => None,
        }
    }

    /// Returns this metric's contribution for any event view, if any.
    #[must_use]
    pub fn contribution(&self, event: EventRef<'_>) -> Option<f64> {
        match event {
            EventRef::Order(o) => self.order_contribution(o),
            EventRef::Trade(t) => self.trade_contribution(t),
            EventRef::Cancel(c) => self.cancel_contribution(c),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TradeVolume => write!(f, "trade_volume"),
            Self::TradeNotional => write!(f, "trade_notional"),
            Self::TradeCount => write!(f, "trade_count"),
            Self::OrderCount => write!(f, "order_count"),
            Self::CancelCount => write!(f, "cancel_count"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Direction;

    #[test]
    fn test_slots_are_dense_and_stable() {
        for (i, kind) in MetricKind::ALL.iter().enumerate() {
            assert_eq!(kind.slot(), i);
        }
    }

    #[test]
    fn test_trade_contributions() {
        let trade = Trade::new(1, 1, 100.0, 150, 0).unwrap();
        assert_eq!(MetricKind::TradeVolume.trade_contribution(&trade), Some(150.0));
        assert_eq!(
            MetricKind::TradeNotional.trade_contribution(&trade),
            Some(15_000.0)
        );
        assert_eq!(MetricKind::TradeCount.trade_contribution(&trade), Some(1.0));
        assert_eq!(MetricKind::OrderCount.trade_contribution(&trade), None);
    }

    #[test]
    fn test_order_contributions() {
        let order = Order::new(1, "A", "C", Direction::Bid, 100.0, 10, 0).unwrap();
        assert_eq!(MetricKind::OrderCount.order_contribution(&order), Some(1.0));
        assert_eq!(MetricKind::TradeVolume.order_contribution(&order), None);
    }

    #[test]
    fn test_cancel_contributions() {
        let cancel = Cancel::new(1, 1, 5, 0).unwrap();
        assert_eq!(MetricKind::CancelCount.cancel_contribution(&cancel), Some(1.0));
        assert_eq!(MetricKind::TradeCount.cancel_contribution(&cancel), None);
    }

    #[test]
    fn test_integer_valued() {
        assert!(MetricKind::TradeVolume.is_integer_valued());
        assert!(!MetricKind::TradeNotional.is_integer_valued());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&MetricKind::TradeNotional).unwrap(),
            "\"trade_notional\""
        );
    }
}
