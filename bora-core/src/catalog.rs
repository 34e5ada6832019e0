//! Read-only instrument reference data.
//!
//! The catalog holds the contract → product and contract → exchange maps
//! loaded from the instrument master at construction time. It is immutable
//! afterwards, so resolution on the event hot path is a plain lock-free
//! hash lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::dimensions::DimensionKey;
use crate::events::{Cancel, EventRef, Order, Trade};
use crate::types::{AccountGroupId, AccountId, ContractId, ExchangeId, ProductId};

/// Static instrument catalog.
///
/// Missing mappings are not errors: resolution yields absent dimension
/// components, and rules that aggregate over those components simply see a
/// collapsed key.
///
/// # Examples
///
/// ```
/// use bora_core::catalog::InstrumentCatalog;
///
/// let catalog = InstrumentCatalog::builder()
///     .product("T2303", "T10Y")
///     .product("T2306", "T10Y")
///     .exchange("T2303", "CFFEX")
///     .build();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentCatalog {
    contract_to_product: HashMap<ContractId, ProductId>,
    contract_to_exchange: HashMap<ContractId, ExchangeId>,
}

impl InstrumentCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a catalog builder.
    #[must_use]
    pub fn builder() -> InstrumentCatalogBuilder {
        InstrumentCatalogBuilder::default()
    }

    /// Creates a catalog from pre-built maps.
    #[must_use]
    pub fn from_maps(
        contract_to_product: HashMap<ContractId, ProductId>,
        contract_to_exchange: HashMap<ContractId, ExchangeId>,
    ) -> Self {
        Self {
            contract_to_product,
            contract_to_exchange,
        }
    }

    /// Looks up the product a contract belongs to.
    #[must_use]
    pub fn product_of(&self, contract: &ContractId) -> Option<&ProductId> {
        self.contract_to_product.get(contract)
    }

    /// Looks up the venue a contract trades on.
    #[must_use]
    pub fn exchange_of(&self, contract: &ContractId) -> Option<&ExchangeId> {
        self.contract_to_exchange.get(contract)
    }

    /// Returns the number of contract → product mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contract_to_product.len()
    }

    /// Returns true if the catalog holds no product mappings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contract_to_product.is_empty()
    }

    /// Resolves raw event fields into a fully populated [`DimensionKey`].
    ///
    /// Product and exchange come from the catalog when the contract is
    /// known; an exchange carried on the event wins over the catalog.
    #[must_use]
    pub fn resolve(
        &self,
        account: Option<&AccountId>,
        contract: Option<&ContractId>,
        exchange: Option<&ExchangeId>,
        account_group: Option<&AccountGroupId>,
    ) -> DimensionKey {
        let product = contract.and_then(|c| self.product_of(c)).cloned();
        let exchange = exchange
            .cloned()
            .or_else(|| contract.and_then(|c| self.exchange_of(c)).cloned());
        DimensionKey {
            account: account.cloned(),
            contract: contract.cloned(),
            product,
            exchange,
            account_group: account_group.cloned(),
        }
    }

    /// Resolves an order's dimensions.
    #[must_use]
    pub fn resolve_order(&self, order: &Order) -> DimensionKey {
        self.resolve(
            Some(&order.account_id),
            Some(&order.contract_id),
            order.exchange_id.as_ref(),
            order.account_group_id.as_ref(),
        )
    }

    /// Resolves a trade's dimensions (post-enrichment fields).
    #[must_use]
    pub fn resolve_trade(&self, trade: &Trade) -> DimensionKey {
        self.resolve(
            trade.account_id.as_ref(),
            trade.contract_id.as_ref(),
            trade.exchange_id.as_ref(),
            trade.account_group_id.as_ref(),
        )
    }

    /// Resolves a cancel's dimensions (post-enrichment fields).
    #[must_use]
    pub fn resolve_cancel(&self, cancel: &Cancel) -> DimensionKey {
        self.resolve(
            cancel.account_id.as_ref(),
            cancel.contract_id.as_ref(),
            cancel.exchange_id.as_ref(),
            cancel.account_group_id.as_ref(),
        )
    }

    /// Resolves any event view's dimensions.
    #[must_use]
    pub fn resolve_event(&self, event: EventRef<'_>) -> DimensionKey {
        match event {
            EventRef::Order(o) => self.resolve_order(o),
            EventRef::Trade(t) => self.resolve_trade(t),
            EventRef::Cancel(c) => self.resolve_cancel(c),
        }
    }
}

/// Builder for [`InstrumentCatalog`].
#[derive(Debug, Default)]
pub struct InstrumentCatalogBuilder {
    contract_to_product: HashMap<ContractId, ProductId>,
    contract_to_exchange: HashMap<ContractId, ExchangeId>,
}

impl InstrumentCatalogBuilder {
    /// Registers a contract → product mapping.
    #[must_use]
    pub fn product(mut self, contract: impl Into<String>, product: impl Into<String>) -> Self {
        self.contract_to_product.insert(
            ContractId::new_unchecked(contract),
            ProductId::new_unchecked(product),
        );
        self
    }

    /// Registers a contract → exchange mapping.
    #[must_use]
    pub fn exchange(mut self, contract: impl Into<String>, exchange: impl Into<String>) -> Self {
        self.contract_to_exchange.insert(
            ContractId::new_unchecked(contract),
            ExchangeId::new_unchecked(exchange),
        );
        self
    }

    /// Finalizes the catalog.
    #[must_use]
    pub fn build(self) -> InstrumentCatalog {
        InstrumentCatalog {
            contract_to_product: self.contract_to_product,
            contract_to_exchange: self.contract_to_exchange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Direction;

    fn catalog() -> InstrumentCatalog {
        InstrumentCatalog::builder()
            .product("T2303", "T10Y")
            .product("T2306", "T10Y")
            .exchange("T2303", "CFFEX")
            .build()
    }

    #[test]
    fn test_product_lookup() {
        let catalog = catalog();
        let contract = ContractId::new_unchecked("T2303");
        assert_eq!(catalog.product_of(&contract).unwrap().as_str(), "T10Y");
        assert!(catalog.product_of(&ContractId::new_unchecked("IF2303")).is_none());
    }

    #[test]
    fn test_resolve_order_populates_product_and_exchange() {
        let order = Order::new(1, "A", "T2303", Direction::Bid, 100.0, 1, 0).unwrap();
        let key = catalog().resolve_order(&order);
        assert_eq!(key.account.as_ref().unwrap().as_str(), "A");
        assert_eq!(key.product.as_ref().unwrap().as_str(), "T10Y");
        assert_eq!(key.exchange.as_ref().unwrap().as_str(), "CFFEX");
    }

    #[test]
    fn test_resolve_unknown_contract_yields_absent_components() {
        let order = Order::new(1, "A", "XYZ999", Direction::Bid, 100.0, 1, 0).unwrap();
        let key = catalog().resolve_order(&order);
        assert!(key.product.is_none());
        assert!(key.exchange.is_none());
        assert_eq!(key.contract.as_ref().unwrap().as_str(), "XYZ999");
    }

    #[test]
    fn test_event_exchange_wins_over_catalog() {
        let order = Order::new(1, "A", "T2303", Direction::Bid, 100.0, 1, 0)
            .unwrap()
            .with_exchange(ExchangeId::new_unchecked("SHFE"));
        let key = catalog().resolve_order(&order);
        assert_eq!(key.exchange.as_ref().unwrap().as_str(), "SHFE");
    }

    #[test]
    fn test_resolve_trade_without_enrichment() {
        let trade = Trade::new(1, 99, 100.0, 5, 0).unwrap();
        let key = catalog().resolve_trade(&trade);
        assert!(key.account.is_none());
        assert!(key.contract.is_none());
        assert!(key.product.is_none());
    }

    #[test]
    fn test_serde_roundtrip() {
        let catalog = catalog();
        let json = serde_json::to_string(&catalog).unwrap();
        let parsed: InstrumentCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), catalog.len());
        let contract = ContractId::new_unchecked("T2306");
        assert_eq!(parsed.product_of(&contract).unwrap().as_str(), "T10Y");
    }
}
