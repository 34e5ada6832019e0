//! # Bora Core
//!
//! Core types for the Bora real-time risk-control engine.
//!
//! This crate provides:
//! - `NewType` wrappers for trading primitives (`AccountId`, `ContractId`,
//!   `Price`, `Volume`, `Nanos`, ...)
//! - The immutable event model (`Order`, `Trade`, `Cancel`)
//! - Multi-dimensional statistics keys (`DimensionKey`, `DimensionMask`)
//! - The read-only instrument catalog (contract → product / exchange)
//! - Metric and action enumerations shared by the statistics substrate and
//!   the rule engine

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Core type definitions and `NewType` wrappers
pub mod types;

/// Immutable event records consumed by the engine
pub mod events;

/// Multi-dimensional statistics keys
pub mod dimensions;

/// Read-only instrument reference data
pub mod catalog;

/// Metric kinds accumulated by the statistics substrate
pub mod metrics;

/// Processing directives emitted by rules
pub mod actions;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::actions::*;
    pub use crate::catalog::*;
    pub use crate::dimensions::*;
    pub use crate::events::*;
    pub use crate::metrics::*;
    pub use crate::types::*;
}
