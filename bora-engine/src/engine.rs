//! The engine core: enrichment, rule dispatch, action emission.

use std::borrow::Cow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use bora_core::actions::{ActionFamily, ActionKind, Subject};
use bora_core::catalog::InstrumentCatalog;
use bora_core::dimensions::{DimensionKey, DimensionMask};
use bora_core::events::{Cancel, EventRef, Order, Trade};
use bora_core::metrics::MetricKind;
use bora_core::types::{Nanos, ValidationError};
use bora_stats::{DailyStats, OrderIndex};

use crate::config::EngineConfig;
use crate::diagnostics::{Counters, Diagnostics};
use crate::error::{ConfigError, EngineError};
use crate::rules::rate_limit::RateLimitRule;
use crate::rules::threshold::ThresholdLimitRule;
use crate::rules::{Rule, RuleContext, RuleSet, RuleVerdict};
use crate::sink::{ActionRecord, ActionTrigger, LatchBoard, LatchState};
use crate::snapshot::{self, SnapshotDoc};

/// Rule identifier used for engine-originated alerts.
pub const ENGINE_RULE_ID: &str = "__engine__";

type Sink = Box<dyn Fn(&ActionRecord<'_>) + Send + Sync>;

/// In-process real-time risk-control engine.
///
/// The engine is free-threaded: any number of ingest threads may call the
/// `on_*` entries concurrently. Per event, the engine enriches missing
/// dimension fields from the order index, dispatches the event to each rule
/// of the rule-set snapshot read at entry, routes proposed actions through
/// the dedup latch board, and invokes the sink callback for every admitted
/// action.
///
/// # Thread safety
///
/// Shared state is limited to the sharded statistics store, the atomic
/// rule-set handle, and the per-subject latches; no global lock covers the
/// hot path. Rule-set updates become visible to subsequent event entries
/// atomically; in-flight events complete against the snapshot they read.
pub struct RiskEngine {
    config: EngineConfig,
    catalog: ArcSwap<InstrumentCatalog>,
    daily: DailyStats,
    order_index: OrderIndex,
    rules: ArcSwap<RuleSet>,
    latches: LatchBoard,
    sink: Sink,
    counters: Counters,
    // Serializes read-modify-write rule mutations; never taken on the
    // event path.
    admin_lock: Mutex<()>,
}

impl RiskEngine {
    /// Creates an engine with the given configuration and sink callback.
    ///
    /// The sink is invoked synchronously on the ingest thread and must not
    /// re-enter the engine with a new event.
    pub fn new<F>(config: EngineConfig, sink: F) -> Self
    where
        F: Fn(&ActionRecord<'_>) + Send + Sync + 'static,
    {
        let catalog = ArcSwap::from_pointee(config.catalog.clone());
        let daily = DailyStats::new(config.num_shards);
        let order_index = OrderIndex::new(config.order_index_capacity);
        info!(
            shards = config.num_shards,
            window_buckets = config.window_buckets,
            order_index_capacity = config.order_index_capacity,
            "risk engine created"
        );
        Self {
            config,
            catalog,
            daily,
            order_index,
            rules: ArcSwap::from_pointee(RuleSet::new()),
            latches: LatchBoard::new(),
            sink: Box::new(sink),
            counters: Counters::default(),
            admin_lock: Mutex::new(()),
        }
    }

    /// Creates an engine wrapped in an `Arc`.
    pub fn new_shared<F>(config: EngineConfig, sink: F) -> Arc<Self>
    where
        F: Fn(&ActionRecord<'_>) + Send + Sync + 'static,
    {
        Arc::new(Self::new(config, sink))
    }

    /// Returns the construction-time configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns a point-in-time copy of the diagnostic counters.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        self.counters.snapshot()
    }

    /// Returns the identifiers of the currently active rules, in dispatch
    /// order.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<String> {
        self.rules
            .load()
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    /// Reads a daily aggregate (read-only inspection).
    #[must_use]
    pub fn aggregate(&self, key: &DimensionKey, metric: MetricKind, ts: Nanos) -> f64 {
        self.daily.get(key, metric, ts)
    }

    /// Reads a dedup latch state (read-only inspection).
    #[must_use]
    pub fn latch_state(&self, subject: &Subject, family: ActionFamily) -> LatchState {
        self.latches.state(subject, family)
    }

    // ========== Event entries ==========

    /// Processes an order submission.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Malformed` without mutating any state when the
    /// order fails boundary validation.
    pub fn on_order(&self, order: &Order) -> Result<(), EngineError> {
        self.validate_order(order)?;
        self.order_index.insert(
            order.oid,
            order.account_id.clone(),
            order.contract_id.clone(),
        );

        let rules = self.rules.load();
        let catalog = self.catalog.load();
        let ctx = RuleContext {
            catalog: &catalog,
            daily: &self.daily,
        };
        let trigger = ActionTrigger::Event(EventRef::Order(order));
        for rule in rules.iter() {
            match catch_unwind(AssertUnwindSafe(|| rule.on_order(&ctx, order))) {
                Ok(Some(verdict)) => self.emit(rule.id(), &verdict, trigger),
                Ok(None) => {}
                Err(_) => {
                    self.invariant_alert(rule.id(), trigger);
                    break;
                }
            }
        }
        Counters::bump(&self.counters.orders_processed);
        Ok(())
    }

    /// Processes a trade, enriching absent account/contract fields from the
    /// order index first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Malformed` without mutating any state when the
    /// trade fails boundary validation.
    pub fn on_trade(&self, trade: &Trade) -> Result<(), EngineError> {
        self.validate_trade(trade)?;
        let trade = self.enriched_trade(trade);

        let rules = self.rules.load();
        let catalog = self.catalog.load();
        let ctx = RuleContext {
            catalog: &catalog,
            daily: &self.daily,
        };
        let trigger = ActionTrigger::Event(EventRef::Trade(&trade));
        for rule in rules.iter() {
            match catch_unwind(AssertUnwindSafe(|| rule.on_trade(&ctx, &trade))) {
                Ok(Some(verdict)) => self.emit(rule.id(), &verdict, trigger),
                Ok(None) => {}
                Err(_) => {
                    self.invariant_alert(rule.id(), trigger);
                    break;
                }
            }
        }
        Counters::bump(&self.counters.trades_processed);
        Ok(())
    }

    /// Processes a cancel, with the same enrichment as [`Self::on_trade`].
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Malformed` without mutating any state when the
    /// cancel fails boundary validation.
    pub fn on_cancel(&self, cancel: &Cancel) -> Result<(), EngineError> {
        self.validate_cancel(cancel)?;
        let cancel = self.enriched_cancel(cancel);

        let rules = self.rules.load();
        let catalog = self.catalog.load();
        let ctx = RuleContext {
            catalog: &catalog,
            daily: &self.daily,
        };
        let trigger = ActionTrigger::Event(EventRef::Cancel(&cancel));
        for rule in rules.iter() {
            match catch_unwind(AssertUnwindSafe(|| rule.on_cancel(&ctx, &cancel))) {
                Ok(Some(verdict)) => self.emit(rule.id(), &verdict, trigger),
                Ok(None) => {}
                Err(_) => {
                    self.invariant_alert(rule.id(), trigger);
                    break;
                }
            }
        }
        Counters::bump(&self.counters.cancels_processed);
        Ok(())
    }

    /// Re-evaluates window-based rules at `now` in the absence of events.
    ///
    /// Idempotent: two consecutive ticks with no intervening events produce
    /// identical (possibly empty) action sequences.
    pub fn tick(&self, now: Nanos) {
        let rules = self.rules.load();
        let trigger = ActionTrigger::Tick(now);
        for rule in rules.iter() {
            for verdict in rule.on_tick(now) {
                self.emit(rule.id(), &verdict, trigger);
            }
        }
        Counters::bump(&self.counters.ticks);
    }

    // ========== Rule management ==========

    /// Registers a rule.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DuplicateRule` if a rule with the same
    /// identifier is active; the previous rule set stays intact.
    pub fn add_rule(&self, rule: Arc<dyn Rule>) -> Result<(), EngineError> {
        let _guard = self.admin_lock.lock();
        let current = self.rules.load_full();
        if current.get(rule.id()).is_some() {
            return Err(ConfigError::DuplicateRule(rule.id().to_string()).into());
        }
        info!(rule_id = %rule.id(), "rule added");
        self.rules.store(Arc::new(current.with_rule(rule)));
        Ok(())
    }

    /// Removes the rule named `rule_id`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownRule` if no such rule is active.
    pub fn remove_rule(&self, rule_id: &str) -> Result<(), EngineError> {
        let _guard = self.admin_lock.lock();
        let current = self.rules.load_full();
        if current.get(rule_id).is_none() {
            return Err(ConfigError::UnknownRule(rule_id.to_string()).into());
        }
        info!(rule_id, "rule removed");
        self.rules.store(Arc::new(current.without_rule(rule_id)));
        Ok(())
    }

    /// Replaces the whole rule set in one atomic swap.
    ///
    /// In-flight events complete against whichever set they read at entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DuplicateRule` if the new set repeats an
    /// identifier; the previous rule set stays intact.
    pub fn replace_rules(&self, rules: Vec<Arc<dyn Rule>>) -> Result<(), EngineError> {
        let _guard = self.admin_lock.lock();
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|r| r.id() == rule.id()) {
                return Err(ConfigError::DuplicateRule(rule.id().to_string()).into());
            }
        }
        let current = self.rules.load_full();
        Self::graft_window_state(&current, &rules);
        info!(count = rules.len(), "rule set replaced");
        self.rules.store(Arc::new(RuleSet::from_rules(rules)));
        Ok(())
    }

    /// Rebuilds the rate-limit rule named `rule_id` with a new threshold
    /// and/or window, discarding its per-key windows.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownRule`, `ConfigError::WrongRuleKind`, or
    /// a validation error from the new parameters; the active rule set is
    /// untouched on failure.
    pub fn update_rate_limit(
        &self,
        rule_id: &str,
        threshold: Option<u64>,
        window_ns: Option<u64>,
    ) -> Result<(), EngineError> {
        let _guard = self.admin_lock.lock();
        let current = self.rules.load_full();
        let rule = current
            .get(rule_id)
            .ok_or_else(|| ConfigError::UnknownRule(rule_id.to_string()))?;
        let rate_limit = rule
            .as_any()
            .downcast_ref::<RateLimitRule>()
            .ok_or_else(|| ConfigError::WrongRuleKind {
                rule_id: rule_id.to_string(),
                expected: "rate-limit",
            })?;

        let mut config = rate_limit.config().clone();
        if let Some(threshold) = threshold {
            config.threshold = threshold;
        }
        if let Some(window_ns) = window_ns {
            config.window_ns = window_ns;
        }
        let geometry_changed = config.window_ns != rate_limit.config().window_ns;
        let replacement = RateLimitRule::new(config)?;
        replacement.inherit_state(rate_limit);
        info!(rule_id, ?threshold, ?window_ns, "rate-limit rule updated");
        self.rules
            .store(Arc::new(current.with_replaced(rule_id, Arc::new(replacement))));

        if geometry_changed {
            // A width change discards the per-key rings; the sink gets to
            // know why its counts restarted from zero.
            let key = DimensionKey::empty();
            let reason = format!("window width changed for rule {rule_id}; counters reset");
            self.forward(ActionRecord {
                action: ActionKind::Alert,
                rule_id: ENGINE_RULE_ID,
                trigger: ActionTrigger::Tick(Nanos::now()),
                key: &key,
                reason: &reason,
            });
        }
        Ok(())
    }

    /// Rebuilds the threshold-limit rule named `rule_id` with a new
    /// threshold and/or dimension mask.
    ///
    /// # Errors
    ///
    /// Same classes as [`Self::update_rate_limit`].
    pub fn update_volume_limit(
        &self,
        rule_id: &str,
        threshold: Option<f64>,
        mask: Option<DimensionMask>,
    ) -> Result<(), EngineError> {
        let _guard = self.admin_lock.lock();
        let current = self.rules.load_full();
        let rule = current
            .get(rule_id)
            .ok_or_else(|| ConfigError::UnknownRule(rule_id.to_string()))?;
        let threshold_rule = rule
            .as_any()
            .downcast_ref::<ThresholdLimitRule>()
            .ok_or_else(|| ConfigError::WrongRuleKind {
                rule_id: rule_id.to_string(),
                expected: "threshold-limit",
            })?;

        let mut config = threshold_rule.config().clone();
        if let Some(threshold) = threshold {
            config.threshold = threshold;
        }
        if let Some(mask) = mask {
            config.mask = mask;
        }
        let replacement = ThresholdLimitRule::new(config)?;
        info!(rule_id, ?threshold, "threshold-limit rule updated");
        self.rules
            .store(Arc::new(current.with_replaced(rule_id, Arc::new(replacement))));
        Ok(())
    }

    // ========== Snapshot / restore ==========

    /// Serializes the engine's durable state: catalog, daily aggregates,
    /// and dedup latches. Rolling-window counters are volatile and re-warm
    /// from live traffic after a restore.
    ///
    /// The caller must quiesce ingest for a consistent capture.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if encoding fails.
    pub fn snapshot(&self) -> Result<Vec<u8>, EngineError> {
        let catalog = self.catalog.load_full();
        let doc = SnapshotDoc::capture(&catalog, &self.daily, &self.latches);
        let bytes = snapshot::encode(&doc)?;
        info!(bytes = bytes.len(), "snapshot captured");
        Ok(bytes)
    }

    /// Restores state captured by [`Self::snapshot`].
    ///
    /// All-or-nothing: the blob is fully decoded and validated before any
    /// engine state is touched; on error the engine is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` for framing, checksum, version, or section
    /// problems.
    pub fn restore(&self, bytes: &[u8]) -> Result<(), EngineError> {
        let doc = snapshot::decode(bytes)?;

        self.catalog.store(Arc::new(doc.catalog));
        self.daily.clear();
        for entry in &doc.daily {
            self.daily
                .absorb(&entry.dimensions, entry.day, entry.metric, entry.value);
        }
        self.latches.clear();
        for entry in &doc.latches {
            let state = if entry.suspended {
                LatchState::Suspended
            } else {
                LatchState::Allowed
            };
            self.latches.set(entry.subject.clone(), entry.family, state);
        }
        info!(
            daily_entries = doc.daily.len(),
            latches = doc.latches.len(),
            "snapshot restored"
        );
        Ok(())
    }

    // ========== Internal ==========

    // A same-id, same-geometry rate-limit rule in a replacement set adopts
    // its predecessor's live window counts and per-key latches, so a
    // threshold-only tightening takes effect against the traffic already
    // inside the window.
    fn graft_window_state(current: &RuleSet, replacements: &[Arc<dyn Rule>]) {
        for rule in replacements {
            let Some(new_rate_limit) = rule.as_any().downcast_ref::<RateLimitRule>() else {
                continue;
            };
            if let Some(previous) = current.get(rule.id()) {
                if let Some(old_rate_limit) = previous.as_any().downcast_ref::<RateLimitRule>() {
                    if !std::ptr::eq(old_rate_limit, new_rate_limit) {
                        new_rate_limit.inherit_state(old_rate_limit);
                    }
                }
            }
        }
    }

    fn validate_order(&self, order: &Order) -> Result<(), EngineError> {
        let check = || -> Result<(), ValidationError> {
            if order.account_id.as_str().is_empty() {
                return Err(ValidationError::EmptyAccountId);
            }
            if order.contract_id.as_str().is_empty() {
                return Err(ValidationError::EmptyContractId);
            }
            let price = order.price.as_f64();
            if !price.is_finite() || price <= 0.0 {
                return Err(ValidationError::InvalidPrice(price));
            }
            if order.volume.as_i32() <= 0 {
                return Err(ValidationError::InvalidVolume(order.volume.as_i32()));
            }
            Ok(())
        };
        check().map_err(|e| self.reject(e))
    }

    fn validate_trade(&self, trade: &Trade) -> Result<(), EngineError> {
        let check = || -> Result<(), ValidationError> {
            let price = trade.price.as_f64();
            if !price.is_finite() || price <= 0.0 {
                return Err(ValidationError::InvalidPrice(price));
            }
            if trade.volume.as_i32() <= 0 {
                return Err(ValidationError::InvalidVolume(trade.volume.as_i32()));
            }
            Ok(())
        };
        check().map_err(|e| self.reject(e))
    }

    fn validate_cancel(&self, cancel: &Cancel) -> Result<(), EngineError> {
        if cancel.volume.as_i32() <= 0 {
            return Err(self.reject(ValidationError::InvalidVolume(cancel.volume.as_i32())));
        }
        Ok(())
    }

    fn reject(&self, error: ValidationError) -> EngineError {
        Counters::bump(&self.counters.malformed_events);
        debug!(%error, "event rejected");
        EngineError::Malformed(error)
    }

    fn enriched_trade<'a>(&self, trade: &'a Trade) -> Cow<'a, Trade> {
        if trade.account_id.is_some() && trade.contract_id.is_some() {
            return Cow::Borrowed(trade);
        }
        match self.order_index.get(trade.oid) {
            Some(dims) => {
                let mut enriched = trade.clone();
                if enriched.account_id.is_none() {
                    enriched.account_id = Some(dims.account_id);
                }
                if enriched.contract_id.is_none() {
                    enriched.contract_id = Some(dims.contract_id);
                }
                Cow::Owned(enriched)
            }
            None => Cow::Borrowed(trade),
        }
    }

    fn enriched_cancel<'a>(&self, cancel: &'a Cancel) -> Cow<'a, Cancel> {
        if cancel.account_id.is_some() && cancel.contract_id.is_some() {
            return Cow::Borrowed(cancel);
        }
        match self.order_index.get(cancel.oid) {
            Some(dims) => {
                let mut enriched = cancel.clone();
                if enriched.account_id.is_none() {
                    enriched.account_id = Some(dims.account_id);
                }
                if enriched.contract_id.is_none() {
                    enriched.contract_id = Some(dims.contract_id);
                }
                Cow::Owned(enriched)
            }
            None => Cow::Borrowed(cancel),
        }
    }

    fn emit(&self, rule_id: &str, verdict: &RuleVerdict, trigger: ActionTrigger<'_>) {
        for &action in &verdict.actions {
            if self.latches.admit(action, &verdict.key) {
                if action.latch_edge().is_some() && action.subject(&verdict.key).is_some() {
                    Counters::bump(&self.counters.latch_transitions);
                }
                self.forward(ActionRecord {
                    action,
                    rule_id,
                    trigger,
                    key: &verdict.key,
                    reason: &verdict.reason,
                });
            } else {
                Counters::bump(&self.counters.actions_deduplicated);
            }
        }
    }

    fn forward(&self, record: ActionRecord<'_>) {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.sink)(&record)));
        Counters::bump(&self.counters.actions_emitted);
        if outcome.is_err() {
            Counters::bump(&self.counters.sink_failures);
            error!(action = %record.action, rule_id = record.rule_id, "sink callback panicked");
        }
    }

    fn invariant_alert(&self, rule_id: &str, trigger: ActionTrigger<'_>) {
        Counters::bump(&self.counters.invariant_alerts);
        error!(rule_id, "rule dispatch panicked; event processing stopped");
        let key = DimensionKey::empty();
        let reason = format!("internal invariant violation in rule {rule_id}");
        self.forward(ActionRecord {
            action: ActionKind::Alert,
            rule_id: ENGINE_RULE_ID,
            trigger,
            key: &key,
            reason: &reason,
        });
    }
}

impl std::fmt::Debug for RiskEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskEngine")
            .field("rules", &self.rule_ids())
            .field("daily_entries", &self.daily.len())
            .field("latches", &self.latches.len())
            .finish_non_exhaustive()
    }
}
