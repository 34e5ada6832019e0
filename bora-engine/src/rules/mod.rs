//! Rule seam and rule-set snapshots.
//!
//! A rule is a pure function of (context, event): all mutable state a rule
//! keeps is interior, per-key, and owned by the rule value itself. The
//! engine holds the current rules as an immutable [`RuleSet`] behind an
//! atomically swappable handle, so ingest threads read the set once per
//! event and never observe a partially updated configuration.

pub mod rate_limit;
pub mod threshold;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use bora_core::catalog::InstrumentCatalog;
use bora_core::dimensions::DimensionKey;
use bora_core::events::{Cancel, Order, Trade};
use bora_core::actions::ActionKind;
use bora_core::types::Nanos;
use bora_stats::DailyStats;

/// Shared state handed to every rule invocation.
pub struct RuleContext<'a> {
    /// Instrument reference data for dimension resolution.
    pub catalog: &'a InstrumentCatalog,
    /// The daily multi-dimensional statistics store.
    pub daily: &'a DailyStats,
}

/// The outcome of a rule firing.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    /// Ordered actions to propose, in emission order.
    pub actions: Vec<ActionKind>,
    /// The (masked) dimension key that triggered; used to derive latch
    /// subjects.
    pub key: DimensionKey,
    /// Human-readable firing reason.
    pub reason: String,
    /// Free-form metadata forwarded to the sink.
    pub metadata: HashMap<String, String>,
}

impl RuleVerdict {
    /// Creates a verdict with the given actions, key, and reason.
    #[must_use]
    pub fn new(actions: Vec<ActionKind>, key: DimensionKey, reason: impl Into<String>) -> Self {
        Self {
            actions,
            key,
            reason: reason.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attaches a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }
}

/// A risk rule.
///
/// Event hooks return `None` when the rule does not fire; statistics
/// updates happen inside the hook, so a later rule in the same dispatch
/// already observes an earlier rule's contribution.
pub trait Rule: Send + Sync {
    /// Stable rule identifier, unique within a rule set.
    fn id(&self) -> &str;

    /// Called for each order event.
    fn on_order(&self, _ctx: &RuleContext<'_>, _order: &Order) -> Option<RuleVerdict> {
        None
    }

    /// Called for each (enriched) trade event.
    fn on_trade(&self, _ctx: &RuleContext<'_>, _trade: &Trade) -> Option<RuleVerdict> {
        None
    }

    /// Called for each (enriched) cancel event.
    fn on_cancel(&self, _ctx: &RuleContext<'_>, _cancel: &Cancel) -> Option<RuleVerdict> {
        None
    }

    /// Called on an external timekeeping tick; lets window-based rules
    /// re-check state in the absence of events. Must be idempotent.
    fn on_tick(&self, _now: Nanos) -> Vec<RuleVerdict> {
        Vec::new()
    }

    /// Upcast for the engine's typed rule mutators.
    fn as_any(&self) -> &dyn Any;
}

/// An immutable, ordered collection of rules.
///
/// Mutation builds a new set; the engine swaps the handle atomically.
/// Dispatch order is insertion order.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a rule set from an ordered vector.
    #[must_use]
    pub fn from_rules(rules: Vec<Arc<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates the rules in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter()
    }

    /// Finds a rule by identifier.
    #[must_use]
    pub fn get(&self, rule_id: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|r| r.id() == rule_id)
    }

    /// Returns a new set with `rule` appended.
    #[must_use]
    pub fn with_rule(&self, rule: Arc<dyn Rule>) -> Self {
        let mut rules = self.rules.clone();
        rules.push(rule);
        Self { rules }
    }

    /// Returns a new set without the rule named `rule_id`.
    #[must_use]
    pub fn without_rule(&self, rule_id: &str) -> Self {
        let rules = self
            .rules
            .iter()
            .filter(|r| r.id() != rule_id)
            .cloned()
            .collect();
        Self { rules }
    }

    /// Returns a new set with the rule named `rule_id` replaced in place.
    #[must_use]
    pub fn with_replaced(&self, rule_id: &str, replacement: Arc<dyn Rule>) -> Self {
        let rules = self
            .rules
            .iter()
            .map(|r| {
                if r.id() == rule_id {
                    Arc::clone(&replacement)
                } else {
                    Arc::clone(r)
                }
            })
            .collect();
        Self { rules }
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedRule(&'static str);

    impl Rule for NamedRule {
        fn id(&self) -> &str {
            self.0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_rule_set_insertion_order() {
        let set = RuleSet::new()
            .with_rule(Arc::new(NamedRule("a")))
            .with_rule(Arc::new(NamedRule("b")));
        let ids: Vec<_> = set.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_rule_set_remove() {
        let set = RuleSet::new()
            .with_rule(Arc::new(NamedRule("a")))
            .with_rule(Arc::new(NamedRule("b")))
            .without_rule("a");
        assert_eq!(set.len(), 1);
        assert!(set.get("a").is_none());
        assert!(set.get("b").is_some());
    }

    #[test]
    fn test_rule_set_replace_preserves_order() {
        let set = RuleSet::new()
            .with_rule(Arc::new(NamedRule("a")))
            .with_rule(Arc::new(NamedRule("b")))
            .with_rule(Arc::new(NamedRule("c")));
        let replaced = set.with_replaced("b", Arc::new(NamedRule("b")));
        let ids: Vec<_> = replaced.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_verdict_metadata() {
        let verdict = RuleVerdict::new(
            vec![ActionKind::Alert],
            DimensionKey::empty(),
            "something happened",
        )
        .with_metadata("value", "42");
        assert_eq!(verdict.metadata.get("value").unwrap(), "42");
    }
}
