//! Multi-dimensional statistics keys.
//!
//! A [`DimensionKey`] is a tuple of up to five optional components. Rules
//! declare which components are "live" via a [`DimensionMask`]; collapsing a
//! key through a mask zeroes the non-live components so that two keys
//! differing only in non-live dimensions aggregate together.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{AccountGroupId, AccountId, ContractId, ExchangeId, ProductId};

/// A statistics partition key over (account, contract, product, exchange,
/// account-group).
///
/// Equality and hashing are structural over the full tuple; an absent
/// component is a distinct value, not a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionKey {
    /// Account component.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account: Option<AccountId>,
    /// Contract component.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contract: Option<ContractId>,
    /// Product component.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub product: Option<ProductId>,
    /// Exchange component.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exchange: Option<ExchangeId>,
    /// Account group component.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account_group: Option<AccountGroupId>,
}

impl DimensionKey {
    /// An all-absent key.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if every component is absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.account.is_none()
            && self.contract.is_none()
            && self.product.is_none()
            && self.exchange.is_none()
            && self.account_group.is_none()
    }

    /// Returns a copy with the components not selected by `mask` cleared.
    #[must_use]
    pub fn masked(&self, mask: DimensionMask) -> Self {
        Self {
            account: if mask.account { self.account.clone() } else { None },
            contract: if mask.contract { self.contract.clone() } else { None },
            product: if mask.product { self.product.clone() } else { None },
            exchange: if mask.exchange { self.exchange.clone() } else { None },
            account_group: if mask.account_group {
                self.account_group.clone()
            } else {
                None
            },
        }
    }

    /// Feeds the key's components into an FNV-1a style byte visitor.
    ///
    /// Each component contributes a one-byte presence tag followed by its
    /// bytes, so `("AB", None)` and `("A", Some("B"))` hash differently.
    pub fn visit_bytes<F: FnMut(&[u8])>(&self, mut visit: F) {
        fn component<F: FnMut(&[u8])>(visit: &mut F, value: Option<&str>) {
            match value {
                Some(s) => {
                    visit(&[1]);
                    visit(s.as_bytes());
                }
                None => visit(&[0]),
            }
        }
        component(&mut visit, self.account.as_ref().map(AccountId::as_str));
        component(&mut visit, self.contract.as_ref().map(ContractId::as_str));
        component(&mut visit, self.product.as_ref().map(ProductId::as_str));
        component(&mut visit, self.exchange.as_ref().map(ExchangeId::as_str));
        component(
            &mut visit,
            self.account_group.as_ref().map(AccountGroupId::as_str),
        );
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut write_part = |f: &mut fmt::Formatter<'_>,
                              name: &str,
                              value: Option<&str>|
         -> fmt::Result {
            if let Some(v) = value {
                if !first {
                    write!(f, ",")?;
                }
                first = false;
                write!(f, "{name}={v}")?;
            }
            Ok(())
        };
        write_part(f, "account", self.account.as_ref().map(AccountId::as_str))?;
        write_part(f, "contract", self.contract.as_ref().map(ContractId::as_str))?;
        write_part(f, "product", self.product.as_ref().map(ProductId::as_str))?;
        write_part(f, "exchange", self.exchange.as_ref().map(ExchangeId::as_str))?;
        write_part(
            f,
            "group",
            self.account_group.as_ref().map(AccountGroupId::as_str),
        )?;
        if first {
            write!(f, "<none>")?;
        }
        Ok(())
    }
}

/// The set of dimension components a rule aggregates over.
///
/// # Examples
///
/// ```
/// use bora_core::dimensions::DimensionMask;
///
/// let mask = DimensionMask::account().with_product();
/// assert!(mask.account);
/// assert!(mask.product);
/// assert!(!mask.contract);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionMask {
    /// Aggregate per account.
    #[serde(default)]
    pub account: bool,
    /// Aggregate per contract.
    #[serde(default)]
    pub contract: bool,
    /// Aggregate per product.
    #[serde(default)]
    pub product: bool,
    /// Aggregate per exchange.
    #[serde(default)]
    pub exchange: bool,
    /// Aggregate per account group.
    #[serde(default)]
    pub account_group: bool,
}

impl DimensionMask {
    /// A mask selecting only the account dimension.
    #[must_use]
    pub fn account() -> Self {
        Self {
            account: true,
            ..Self::default()
        }
    }

    /// Returns true if no dimension is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.account || self.contract || self.product || self.exchange || self.account_group)
    }

    /// Adds the contract dimension.
    #[must_use]
    pub const fn with_contract(mut self) -> Self {
        self.contract = true;
        self
    }

    /// Adds the product dimension.
    #[must_use]
    pub const fn with_product(mut self) -> Self {
        self.product = true;
        self
    }

    /// Adds the exchange dimension.
    #[must_use]
    pub const fn with_exchange(mut self) -> Self {
        self.exchange = true;
        self
    }

    /// Adds the account group dimension.
    #[must_use]
    pub const fn with_account_group(mut self) -> Self {
        self.account_group = true;
        self
    }
}

impl fmt::Display for DimensionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(5);
        if self.account {
            parts.push("account");
        }
        if self.contract {
            parts.push("contract");
        }
        if self.product {
            parts.push("product");
        }
        if self.exchange {
            parts.push("exchange");
        }
        if self.account_group {
            parts.push("account_group");
        }
        write!(f, "{}", parts.join("+"))
    }
}
