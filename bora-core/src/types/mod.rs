//! `NewType` wrappers for trading primitives.
//!
//! This module provides type-safe wrappers around raw values to prevent
//! mixing incompatible quantities at compile time and to centralize input
//! validation at the system boundary.
//!
//! # Types
//!
//! - [`AccountId`], [`ContractId`], [`ProductId`], [`ExchangeId`],
//!   [`AccountGroupId`] - opaque non-empty identifiers
//! - [`OrderId`], [`TradeId`], [`CancelId`] - numeric event identifiers
//! - [`Price`] - finite, strictly positive price values
//! - [`Volume`] - strictly positive lot counts
//! - [`Nanos`] - nanosecond Unix timestamps
//! - [`DayId`] - UTC day numbers derived from timestamps

mod ids;
mod price;
mod timestamp;
mod volume;

pub use ids::{AccountGroupId, AccountId, CancelId, ContractId, ExchangeId, OrderId, ProductId, TradeId};
pub use price::Price;
pub use timestamp::{DayId, Nanos};
pub use volume::Volume;

/// Validation error for `NewType` construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Account ID is empty
    #[error("account ID cannot be empty")]
    EmptyAccountId,

    /// Contract ID is empty
    #[error("contract ID cannot be empty")]
    EmptyContractId,

    /// Product ID is empty
    #[error("product ID cannot be empty")]
    EmptyProductId,

    /// Exchange ID is empty
    #[error("exchange ID cannot be empty")]
    EmptyExchangeId,

    /// Account group ID is empty
    #[error("account group ID cannot be empty")]
    EmptyAccountGroupId,

    /// Price is NaN, infinite, or not strictly positive
    #[error("price must be finite and positive: {0}")]
    InvalidPrice(f64),

    /// Volume is zero or negative
    #[error("volume must be positive: {0}")]
    InvalidVolume(i32),
}
