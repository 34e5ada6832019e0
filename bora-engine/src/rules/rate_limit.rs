//! Sliding-window rate-limit rule with automatic resume.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use bora_core::actions::ActionKind;
use bora_core::dimensions::{DimensionKey, DimensionMask};
use bora_core::events::Order;
use bora_core::types::{AccountId, Nanos};
use bora_stats::{RollingWindow, WindowSpec, DEFAULT_WINDOW_BUCKETS};

use crate::error::ConfigError;
use crate::rules::{Rule, RuleContext, RuleVerdict};

/// Configuration of a [`RateLimitRule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Stable rule identifier.
    pub rule_id: String,
    /// Maximum events tolerated inside the window; the window sum must
    /// strictly exceed this to trigger a suspend.
    pub threshold: u64,
    /// Window width in nanoseconds.
    pub window_ns: u64,
    /// Bucket count of the per-key rolling window ring.
    pub buckets: usize,
    /// Live dimensions the window is keyed by.
    pub mask: DimensionMask,
    /// Actions proposed on the transition into the exceeded state.
    pub suspend_actions: Vec<ActionKind>,
    /// Actions proposed on the transition back.
    pub resume_actions: Vec<ActionKind>,
    /// Per-account threshold overrides consulted before `threshold`.
    #[serde(default)]
    pub account_overrides: HashMap<AccountId, u64>,
}

impl RateLimitConfig {
    /// Creates a configuration keyed per account with the default bucket
    /// count and suspend/resume ordering actions.
    #[must_use]
    pub fn new(rule_id: impl Into<String>, threshold: u64, window_ns: u64) -> Self {
        Self {
            rule_id: rule_id.into(),
            threshold,
            window_ns,
            buckets: DEFAULT_WINDOW_BUCKETS,
            mask: DimensionMask::account(),
            suspend_actions: vec![ActionKind::SuspendOrdering],
            resume_actions: vec![ActionKind::ResumeOrdering],
            account_overrides: HashMap::new(),
        }
    }

    /// Creates a configuration with the window given in whole seconds.
    #[must_use]
    pub fn per_seconds(rule_id: impl Into<String>, threshold: u64, window_secs: u64) -> Self {
        Self::new(rule_id, threshold, window_secs * 1_000_000_000)
    }

    /// Sets the live-dimension mask.
    #[must_use]
    pub fn with_mask(mut self, mask: DimensionMask) -> Self {
        self.mask = mask;
        self
    }

    /// Sets the ring bucket count.
    #[must_use]
    pub fn with_buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    /// Replaces the suspend action tuple.
    #[must_use]
    pub fn with_suspend_actions(mut self, actions: Vec<ActionKind>) -> Self {
        self.suspend_actions = actions;
        self
    }

    /// Replaces the resume action tuple.
    #[must_use]
    pub fn with_resume_actions(mut self, actions: Vec<ActionKind>) -> Self {
        self.resume_actions = actions;
        self
    }

    /// Adds a per-account threshold override.
    #[must_use]
    pub fn with_account_override(mut self, account: AccountId, threshold: u64) -> Self {
        self.account_overrides.insert(account, threshold);
        self
    }

    /// Validates the configuration and resolves the window geometry.
    pub fn validate(&self) -> Result<WindowSpec, ConfigError> {
        if self.threshold == 0 {
            return Err(ConfigError::NonPositiveThreshold(0.0));
        }
        if self.mask.is_empty() {
            return Err(ConfigError::EmptyDimensionMask {
                rule_id: self.rule_id.clone(),
            });
        }
        if self.suspend_actions.is_empty() {
            return Err(ConfigError::NoActions {
                rule_id: self.rule_id.clone(),
            });
        }
        Ok(WindowSpec::new(self.window_ns, self.buckets)?)
    }
}

#[derive(Debug)]
struct KeyState {
    window: RollingWindow,
    exceeded: AtomicBool,
}

/// Order-rate limit over a per-key sliding window.
///
/// The rule counts order submissions per live key. Crossing the threshold
/// flips the key's latch and proposes the suspend actions once; as the
/// window slides and the sum falls back to the threshold or below, the
/// next order (or an external [`Rule::on_tick`]) flips the latch back and
/// proposes the resume actions. Trades and cancels are ignored.
///
/// Reconfiguring threshold or window replaces the rule wholesale, which
/// discards all per-key rings; counts re-warm from live traffic.
#[derive(Debug)]
pub struct RateLimitRule {
    config: RateLimitConfig,
    spec: WindowSpec,
    keys: DashMap<DimensionKey, Arc<KeyState>>,
}

impl RateLimitRule {
    /// Creates a rule from a validated configuration.
    pub fn new(config: RateLimitConfig) -> Result<Self, ConfigError> {
        let spec = config.validate()?;
        Ok(Self {
            config,
            spec,
            keys: DashMap::new(),
        })
    }

    /// Returns the rule's configuration.
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Adopts the per-key windows and latches of a predecessor rule.
    ///
    /// Counts inside a live window survive a threshold-only replacement; a
    /// geometry change (window width or bucket count) discards the rings
    /// instead, and counts re-warm from traffic.
    pub fn inherit_state(&self, predecessor: &Self) {
        if self.spec != predecessor.spec {
            debug!(
                rule_id = %self.config.rule_id,
                "window geometry changed; per-key counters discarded"
            );
            return;
        }
        for entry in predecessor.keys.iter() {
            self.keys
                .insert(entry.key().clone(), Arc::clone(entry.value()));
        }
    }

    fn threshold_for(&self, key: &DimensionKey) -> u64 {
        key.account
            .as_ref()
            .and_then(|account| self.config.account_overrides.get(account))
            .copied()
            .unwrap_or(self.config.threshold)
    }

    fn state_for(&self, key: &DimensionKey) -> Arc<KeyState> {
        if let Some(state) = self.keys.get(key) {
            return Arc::clone(state.value());
        }
        Arc::clone(
            self.keys
                .entry(key.clone())
                .or_insert_with(|| {
                    Arc::new(KeyState {
                        window: self.spec.build(),
                        exceeded: AtomicBool::new(false),
                    })
                })
                .value(),
        )
    }

    fn suspend_verdict(&self, key: DimensionKey, count: u64, threshold: u64) -> RuleVerdict {
        warn!(
            rule_id = %self.config.rule_id,
            key = %key,
            count,
            threshold,
            "order rate exceeded"
        );
        let reason = format!(
            "order_count exceeded threshold {} on {} (value {} in {}ns)",
            threshold, key, count, self.config.window_ns
        );
        RuleVerdict::new(self.config.suspend_actions.clone(), key, reason)
            .with_metadata("count", count.to_string())
    }

    fn resume_verdict(&self, key: DimensionKey, count: u64, threshold: u64) -> RuleVerdict {
        debug!(
            rule_id = %self.config.rule_id,
            key = %key,
            count,
            threshold,
            "order rate back under threshold"
        );
        let reason = format!(
            "order_count back under threshold {} on {} (value {})",
            threshold, key, count
        );
        RuleVerdict::new(self.config.resume_actions.clone(), key, reason)
            .with_metadata("count", count.to_string())
    }
}

impl Rule for RateLimitRule {
    fn id(&self) -> &str {
        &self.config.rule_id
    }

    fn on_order(&self, ctx: &RuleContext<'_>, order: &Order) -> Option<RuleVerdict> {
        let key = ctx.catalog.resolve_order(order).masked(self.config.mask);
        let state = self.state_for(&key);
        let count = state.window.increment(order.timestamp);
        let threshold = self.threshold_for(&key);

        if count > threshold {
            if state
                .exceeded
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(self.suspend_verdict(key, count, threshold));
            }
        } else if state
            .exceeded
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return Some(self.resume_verdict(key, count, threshold));
        }
        None
    }

    fn on_tick(&self, now: Nanos) -> Vec<RuleVerdict> {
        let mut verdicts = Vec::new();
        for entry in self.keys.iter() {
            let (key, state) = entry.pair();
            if !state.exceeded.load(Ordering::Acquire) {
                continue;
            }
            let count = state.window.sum(now);
            let threshold = self.threshold_for(key);
            if count <= threshold
                && state
                    .exceeded
                    .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                verdicts.push(self.resume_verdict(key.clone(), count, threshold));
            }
        }
        verdicts
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
