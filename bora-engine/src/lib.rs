//! # Bora Engine
//!
//! Real-time risk-control engine core for high-frequency trading pipelines.
//!
//! The engine consumes order/trade/cancel events, updates the concurrent
//! statistics substrate, evaluates an atomically swappable set of rules
//! against each event, and emits deduplicated processing directives to a
//! synchronous sink callback.
//!
//! This crate provides:
//! - [`RiskEngine`] - the engine core (`on_order` / `on_trade` / `on_cancel`,
//!   rule management, snapshot/restore, tick, diagnostics)
//! - [`Rule`] - the rule seam, plus the built-in [`ThresholdLimitRule`] and
//!   [`RateLimitRule`]
//! - [`LatchBoard`] - the per-(subject, family) suspend/resume dedup latch
//! - The snapshot codec and the optional batch ingest adapter
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bora_core::catalog::InstrumentCatalog;
//! use bora_core::dimensions::DimensionMask;
//! use bora_core::events::{Direction, Order};
//! use bora_core::actions::ActionKind;
//! use bora_core::metrics::MetricKind;
//! use bora_engine::{EngineConfig, RiskEngine, ThresholdLimitConfig, ThresholdLimitRule};
//!
//! let catalog = InstrumentCatalog::builder()
//!     .product("T2303", "T10Y")
//!     .build();
//! let config = EngineConfig::new().with_catalog(catalog);
//!
//! let rule = ThresholdLimitRule::new(
//!     ThresholdLimitConfig::new("VOL-1000", MetricKind::TradeVolume, 1000.0)
//!         .with_mask(DimensionMask::account().with_product())
//!         .with_action(ActionKind::SuspendAccountTrading),
//! )
//! .unwrap();
//!
//! let engine = RiskEngine::new(config, |record| {
//!     println!("{} from {}", record.action, record.rule_id);
//! });
//! engine.add_rule(Arc::new(rule)).unwrap();
//!
//! let order = Order::new(1, "ACC", "T2303", Direction::Bid, 100.0, 10, 0).unwrap();
//! engine.on_order(&order).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod diagnostics;
mod engine;
mod error;
mod ingest;
pub mod rules;
mod sink;
mod snapshot;

pub use config::EngineConfig;
pub use diagnostics::Diagnostics;
pub use engine::{RiskEngine, ENGINE_RULE_ID};
pub use error::{ConfigError, EngineError, SnapshotError};
pub use ingest::{BatchIngest, IngestError, IngestStats};
pub use rules::rate_limit::{RateLimitConfig, RateLimitRule};
pub use rules::threshold::{ThresholdLimitConfig, ThresholdLimitRule};
pub use rules::{Rule, RuleContext, RuleSet, RuleVerdict};
pub use sink::{ActionRecord, ActionTrigger, LatchBoard, LatchState};
