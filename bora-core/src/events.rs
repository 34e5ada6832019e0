//! Immutable event records consumed by the engine.
//!
//! Three event kinds flow through the pipeline: [`Order`], [`Trade`], and
//! [`Cancel`]. Orders always carry their account and contract; trades and
//! cancels may arrive with those fields absent, in which case the engine
//! enriches them from the short-lived order index before rule dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{
    AccountGroupId, AccountId, CancelId, ContractId, ExchangeId, Nanos, OrderId, Price, TradeId,
    ValidationError, Volume,
};

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Buy side.
    Bid,
    /// Sell side.
    Ask,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "BID"),
            Self::Ask => write!(f, "ASK"),
        }
    }
}

/// Event kind discriminant, used by rules to declare applicability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An order submission.
    Order,
    /// A fill reported by the matching engine.
    Trade,
    /// A cancel request.
    Cancel,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order => write!(f, "order"),
            Self::Trade => write!(f, "trade"),
            Self::Cancel => write!(f, "cancel"),
        }
    }
}

/// An order submission event.
///
/// Orders are immutable once constructed; all numeric fields are validated
/// at the boundary so the hot path never re-checks them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Gateway-assigned order identifier.
    pub oid: OrderId,
    /// Owning account.
    pub account_id: AccountId,
    /// Instrument being traded.
    pub contract_id: ContractId,
    /// Buy or sell.
    pub direction: Direction,
    /// Limit price.
    pub price: Price,
    /// Lot count.
    pub volume: Volume,
    /// Submission time, nanoseconds since Unix epoch.
    pub timestamp: Nanos,
    /// Venue, when known upstream.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exchange_id: Option<ExchangeId>,
    /// Account group, when the account belongs to one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account_group_id: Option<AccountGroupId>,
}

impl Order {
    /// Creates a new validated `Order`.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if any identifier is empty, the price is
    /// non-finite or non-positive, or the volume is non-positive.
    pub fn new(
        oid: u64,
        account_id: impl Into<String>,
        contract_id: impl Into<String>,
        direction: Direction,
        price: f64,
        volume: i32,
        timestamp: u64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            oid: OrderId::new(oid),
            account_id: AccountId::new(account_id)?,
            contract_id: ContractId::new(contract_id)?,
            direction,
            price: Price::new(price)?,
            volume: Volume::new(volume)?,
            timestamp: Nanos::new(timestamp),
            exchange_id: None,
            account_group_id: None,
        })
    }

    /// Sets the exchange dimension.
    #[must_use]
    pub fn with_exchange(mut self, exchange_id: ExchangeId) -> Self {
        self.exchange_id = Some(exchange_id);
        self
    }

    /// Sets the account group dimension.
    #[must_use]
    pub fn with_account_group(mut self, group_id: AccountGroupId) -> Self {
        self.account_group_id = Some(group_id);
        self
    }
}

/// A fill event reported by the matching engine.
///
/// `account_id` and `contract_id` are optional: when absent they are filled
/// from the order referenced by `oid`. A trade whose order is unknown is
/// still processed with whatever fields it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Matching-engine trade identifier.
    pub tid: TradeId,
    /// The order this fill belongs to.
    pub oid: OrderId,
    /// Fill price.
    pub price: Price,
    /// Filled lot count.
    pub volume: Volume,
    /// Fill time, nanoseconds since Unix epoch.
    pub timestamp: Nanos,
    /// Owning account, if carried on the wire.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account_id: Option<AccountId>,
    /// Instrument, if carried on the wire.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contract_id: Option<ContractId>,
    /// Venue, if carried on the wire.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exchange_id: Option<ExchangeId>,
    /// Account group, if carried on the wire.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account_group_id: Option<AccountGroupId>,
}

impl Trade {
    /// Creates a new validated `Trade` with no dimension fields.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the price is non-finite or
    /// non-positive, or the volume is non-positive.
    pub fn new(
        tid: u64,
        oid: u64,
        price: f64,
        volume: i32,
        timestamp: u64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            tid: TradeId::new(tid),
            oid: OrderId::new(oid),
            price: Price::new(price)?,
            volume: Volume::new(volume)?,
            timestamp: Nanos::new(timestamp),
            account_id: None,
            contract_id: None,
            exchange_id: None,
            account_group_id: None,
        })
    }

    /// Sets the account dimension.
    #[must_use]
    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Sets the contract dimension.
    #[must_use]
    pub fn with_contract(mut self, contract_id: ContractId) -> Self {
        self.contract_id = Some(contract_id);
        self
    }

    /// Sets the exchange dimension.
    #[must_use]
    pub fn with_exchange(mut self, exchange_id: ExchangeId) -> Self {
        self.exchange_id = Some(exchange_id);
        self
    }
}

/// A cancel request event.
///
/// Enrichment rules match [`Trade`]: absent dimension fields are filled
/// from the order index when the referenced order is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancel {
    /// Cancel request identifier.
    pub cid: CancelId,
    /// The order being cancelled.
    pub oid: OrderId,
    /// Lot count being cancelled.
    pub volume: Volume,
    /// Request time, nanoseconds since Unix epoch.
    pub timestamp: Nanos,
    /// Owning account, if carried on the wire.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account_id: Option<AccountId>,
    /// Instrument, if carried on the wire.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contract_id: Option<ContractId>,
    /// Venue, if carried on the wire.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exchange_id: Option<ExchangeId>,
    /// Account group, if carried on the wire.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account_group_id: Option<AccountGroupId>,
}

impl Cancel {
    /// Creates a new validated `Cancel` with no dimension fields.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the volume is non-positive.
    pub fn new(cid: u64, oid: u64, volume: i32, timestamp: u64) -> Result<Self, ValidationError> {
        Ok(Self {
            cid: CancelId::new(cid),
            oid: OrderId::new(oid),
            volume: Volume::new(volume)?,
            timestamp: Nanos::new(timestamp),
            account_id: None,
            contract_id: None,
            exchange_id: None,
            account_group_id: None,
        })
    }

    /// Sets the account dimension.
    #[must_use]
    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Sets the contract dimension.
    #[must_use]
    pub fn with_contract(mut self, contract_id: ContractId) -> Self {
        self.contract_id = Some(contract_id);
        self
    }

    /// Sets the exchange dimension.
    #[must_use]
    pub fn with_exchange(mut self, exchange_id: ExchangeId) -> Self {
        self.exchange_id = Some(exchange_id);
        self
    }
}

/// A borrowed view over any event, used on the action path so sinks can
/// inspect the originating event without cloning it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventRef<'a> {
    /// An order submission.
    Order(&'a Order),
    /// A fill.
    Trade(&'a Trade),
    /// A cancel request.
    Cancel(&'a Cancel),
}

impl EventRef<'_> {
    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Order(_) => EventKind::Order,
            Self::Trade(_) => EventKind::Trade,
            Self::Cancel(_) => EventKind::Cancel,
        }
    }

    /// Returns the event timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> Nanos {
        match self {
            Self::Order(o) => o.timestamp,
            Self::Trade(t) => t.timestamp,
            Self::Cancel(c) => c.timestamp,
        }
    }

    /// Returns the account the event belongs to, when known.
    #[must_use]
    pub fn account_id(&self) -> Option<&AccountId> {
        match self {
            Self::Order(o) => Some(&o.account_id),
            Self::Trade(t) => t.account_id.as_ref(),
            Self::Cancel(c) => c.account_id.as_ref(),
        }
    }

    /// Returns the instrument the event refers to, when known.
    #[must_use]
    pub fn contract_id(&self) -> Option<&ContractId> {
        match self {
            Self::Order(o) => Some(&o.contract_id),
            Self::Trade(t) => t.contract_id.as_ref(),
            Self::Cancel(c) => c.contract_id.as_ref(),
        }
    }
}
