//! Threshold-limit rule over daily metric aggregates.

use std::any::Any;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use bora_core::actions::ActionKind;
use bora_core::dimensions::DimensionMask;
use bora_core::events::{Cancel, EventKind, EventRef, Order, Trade};
use bora_core::metrics::MetricKind;

use crate::error::ConfigError;
use crate::rules::{Rule, RuleContext, RuleVerdict};

/// Configuration of a [`ThresholdLimitRule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLimitConfig {
    /// Stable rule identifier.
    pub rule_id: String,
    /// The metric the rule accumulates and compares.
    pub metric: MetricKind,
    /// Breach threshold; a breach requires the aggregate to strictly exceed
    /// this value.
    pub threshold: f64,
    /// Actions proposed on breach, in emission order.
    pub actions: Vec<ActionKind>,
    /// Live dimensions the aggregate is partitioned by.
    pub mask: DimensionMask,
    /// Event kinds the rule reacts to; `None` means every kind the metric
    /// can contribute on.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub applies_to: Option<Vec<EventKind>>,
}

impl ThresholdLimitConfig {
    /// Creates a configuration with an account-dimension mask and no
    /// actions.
    #[must_use]
    pub fn new(rule_id: impl Into<String>, metric: MetricKind, threshold: f64) -> Self {
        Self {
            rule_id: rule_id.into(),
            metric,
            threshold,
            actions: Vec::new(),
            mask: DimensionMask::account(),
            applies_to: None,
        }
    }

    /// Sets the live-dimension mask.
    #[must_use]
    pub fn with_mask(mut self, mask: DimensionMask) -> Self {
        self.mask = mask;
        self
    }

    /// Appends an action to propose on breach.
    #[must_use]
    pub fn with_action(mut self, action: ActionKind) -> Self {
        self.actions.push(action);
        self
    }

    /// Restricts the rule to the given event kinds.
    #[must_use]
    pub fn with_applies_to(mut self, kinds: Vec<EventKind>) -> Self {
        self.applies_to = Some(kinds);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::NonFiniteThreshold(self.threshold));
        }
        if self.threshold <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold(self.threshold));
        }
        if self.mask.is_empty() {
            return Err(ConfigError::EmptyDimensionMask {
                rule_id: self.rule_id.clone(),
            });
        }
        if self.actions.is_empty() {
            return Err(ConfigError::NoActions {
                rule_id: self.rule_id.clone(),
            });
        }
        if let Some(kinds) = &self.applies_to {
            let applicable = kinds.iter().any(|kind| match kind {
                EventKind::Order => matches!(self.metric, MetricKind::OrderCount),
                EventKind::Trade => matches!(
                    self.metric,
                    MetricKind::TradeVolume | MetricKind::TradeNotional | MetricKind::TradeCount
                ),
                EventKind::Cancel => matches!(self.metric, MetricKind::CancelCount),
            });
            if !applicable {
                return Err(ConfigError::InapplicableMetric {
                    rule_id: self.rule_id.clone(),
                    metric: self.metric,
                });
            }
        }
        Ok(())
    }

    fn accepts(&self, kind: EventKind) -> bool {
        self.applies_to
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&kind))
    }
}

/// Daily threshold-limit rule.
///
/// Per event the rule resolves the masked dimension key, folds the event's
/// metric contribution into the daily aggregate, and proposes its actions
/// when the new aggregate strictly exceeds the threshold. Equality is not a
/// breach. Dedup of repeated breaches is the engine latch's concern, so the
/// rule itself stays stateless over the statistics store.
#[derive(Debug)]
pub struct ThresholdLimitRule {
    config: ThresholdLimitConfig,
}

impl ThresholdLimitRule {
    /// Creates a rule from a validated configuration.
    pub fn new(config: ThresholdLimitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the rule's configuration.
    #[must_use]
    pub fn config(&self) -> &ThresholdLimitConfig {
        &self.config
    }

    fn evaluate(&self, ctx: &RuleContext<'_>, event: EventRef<'_>) -> Option<RuleVerdict> {
        if !self.config.accepts(event.kind()) {
            return None;
        }
        let contribution = self.config.metric.contribution(event)?;
        let key = ctx.catalog.resolve_event(event).masked(self.config.mask);
        let value = ctx
            .daily
            .add(&key, self.config.metric, contribution, event.timestamp());
        if value > self.config.threshold {
            warn!(
                rule_id = %self.config.rule_id,
                metric = %self.config.metric,
                threshold = self.config.threshold,
                value,
                key = %key,
                "threshold breached"
            );
            let reason = format!(
                "{} exceeded threshold {} on {} (value {})",
                self.config.metric, self.config.threshold, key, value
            );
            let mut metadata = HashMap::new();
            metadata.insert("value".to_string(), value.to_string());
            metadata.insert("threshold".to_string(), self.config.threshold.to_string());
            Some(RuleVerdict {
                actions: self.config.actions.clone(),
                key,
                reason,
                metadata,
            })
        } else {
            None
        }
    }
}

impl Rule for ThresholdLimitRule {
    fn id(&self) -> &str {
        &self.config.rule_id
    }

    fn on_order(&self, ctx: &RuleContext<'_>, order: &Order) -> Option<RuleVerdict> {
        self.evaluate(ctx, EventRef::Order(order))
    }

    fn on_trade(&self, ctx: &RuleContext<'_>, trade: &Trade) -> Option<RuleVerdict> {
        self.evaluate(ctx, EventRef::Trade(trade))
    }

    fn on_cancel(&self, ctx: &RuleContext<'_>, cancel: &Cancel) -> Option<RuleVerdict> {
        self.evaluate(ctx, EventRef::Cancel(cancel))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bora_core::catalog::InstrumentCatalog;
    use bora_core::events::Direction;
    use bora_core::types::AccountId;
    use bora_stats::DailyStats;

    const T0: u64 = 1_700_000_000_000_000_000;

    fn catalog() -> InstrumentCatalog {
        InstrumentCatalog::builder()
            .product("T2303", "T10Y")
            .product("T2306", "T10Y")
            .build()
    }

    fn volume_rule(threshold: f64) -> ThresholdLimitRule {
        ThresholdLimitRule::new(
            ThresholdLimitConfig::new("VOL", MetricKind::TradeVolume, threshold)
                .with_mask(DimensionMask::account().with_product())
                .with_action(ActionKind::SuspendAccountTrading),
        )
        .unwrap()
    }

    fn trade(tid: u64, contract: &str, volume: i32, ts: u64) -> Trade {
        Trade::new(tid, tid, 100.0, volume, ts)
            .unwrap()
            .with_account(AccountId::new_unchecked("A"))
            .with_contract(bora_core::types::ContractId::new_unchecked(contract))
    }

    #[test]
    fn test_validation_rejects_bad_config() {
        let config = ThresholdLimitConfig::new("R", MetricKind::TradeVolume, 0.0)
            .with_action(ActionKind::Alert);
        assert!(matches!(
            ThresholdLimitRule::new(config),
            Err(ConfigError::NonPositiveThreshold(_))
        ));

        let config = ThresholdLimitConfig::new("R", MetricKind::TradeVolume, f64::NAN)
            .with_action(ActionKind::Alert);
        assert!(matches!(
            ThresholdLimitRule::new(config),
            Err(ConfigError::NonFiniteThreshold(_))
        ));

        let config = ThresholdLimitConfig::new("R", MetricKind::TradeVolume, 10.0);
        assert!(matches!(
            ThresholdLimitRule::new(config),
            Err(ConfigError::NoActions { .. })
        ));

        let config = ThresholdLimitConfig::new("R", MetricKind::TradeVolume, 10.0)
            .with_mask(DimensionMask::default())
            .with_action(ActionKind::Alert);
        assert!(matches!(
            ThresholdLimitRule::new(config),
            Err(ConfigError::EmptyDimensionMask { .. })
        ));

        let config = ThresholdLimitConfig::new("R", MetricKind::TradeVolume, 10.0)
            .with_action(ActionKind::Alert)
            .with_applies_to(vec![EventKind::Order]);
        assert!(matches!(
            ThresholdLimitRule::new(config),
            Err(ConfigError::InapplicableMetric { .. })
        ));
    }

    #[test]
    fn test_fires_only_on_strict_excess() {
        let catalog = catalog();
        let daily = DailyStats::new(8);
        let ctx = RuleContext {
            catalog: &catalog,
            daily: &daily,
        };
        let rule = volume_rule(300.0);

        // 150 + 150 == threshold: no breach at equality.
        assert!(rule.on_trade(&ctx, &trade(1, "T2303", 150, T0)).is_none());
        assert!(rule.on_trade(&ctx, &trade(2, "T2306", 150, T0 + 1)).is_none());

        // One more lot pushes the aggregate past the threshold.
        let verdict = rule.on_trade(&ctx, &trade(3, "T2303", 1, T0 + 2)).unwrap();
        assert_eq!(verdict.actions, vec![ActionKind::SuspendAccountTrading]);
        assert!(verdict.reason.contains("trade_volume"));
        assert!(verdict.reason.contains("301"));
    }

    #[test]
    fn test_product_dimension_aggregates_across_contracts() {
        let catalog = catalog();
        let daily = DailyStats::new(8);
        let ctx = RuleContext {
            catalog: &catalog,
            daily: &daily,
        };
        let rule = volume_rule(500.0);

        assert!(rule.on_trade(&ctx, &trade(1, "T2303", 300, T0)).is_none());
        // Different contract, same product: the aggregate carries over.
        let verdict = rule.on_trade(&ctx, &trade(2, "T2306", 250, T0 + 1)).unwrap();
        assert!(verdict.key.product.is_some());
        assert!(verdict.key.contract.is_none());
    }

    #[test]
    fn test_ignores_events_without_contribution() {
        let catalog = catalog();
        let daily = DailyStats::new(8);
        let ctx = RuleContext {
            catalog: &catalog,
            daily: &daily,
        };
        let rule = volume_rule(10.0);
        let order = Order::new(1, "A", "T2303", Direction::Bid, 100.0, 500, T0).unwrap();
        assert!(rule.on_order(&ctx, &order).is_none());
        // The order contributed nothing to the trade-volume aggregate.
        assert!(daily.is_empty());
    }

    #[test]
    fn test_cancel_count_monitoring() {
        let catalog = InstrumentCatalog::new();
        let daily = DailyStats::new(8);
        let ctx = RuleContext {
            catalog: &catalog,
            daily: &daily,
        };
        let rule = ThresholdLimitRule::new(
            ThresholdLimitConfig::new("CANCELS", MetricKind::CancelCount, 3.0)
                .with_action(ActionKind::BlockCancel),
        )
        .unwrap();

        for i in 0..3 {
            let cancel = Cancel::new(i, i, 1, T0 + i)
                .unwrap()
                .with_account(AccountId::new_unchecked("A"));
            assert!(rule.on_cancel(&ctx, &cancel).is_none());
        }
        let cancel = Cancel::new(4, 4, 1, T0 + 4)
            .unwrap()
            .with_account(AccountId::new_unchecked("A"));
        let verdict = rule.on_cancel(&ctx, &cancel).unwrap();
        assert_eq!(verdict.actions, vec![ActionKind::BlockCancel]);
    }
}
