//! Identifier types for accounts, instruments, and events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Account ID type - used for identifying trading accounts.
///
/// Wraps a `String` value with validation to ensure non-empty. Account IDs
/// are opaque to the engine; no format beyond non-emptiness is assumed.
///
/// # Examples
///
/// ```
/// use bora_core::types::AccountId;
///
/// let account = AccountId::new("ACC_001").unwrap();
/// assert_eq!(account.as_str(), "ACC_001");
/// assert!(AccountId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates a new `AccountId` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyAccountId` if the string is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyAccountId);
        }
        Ok(Self(s))
    }

    /// Creates a new `AccountId` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is non-empty.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

/// Contract ID type - identifies a tradable instrument (e.g. "T2303").
///
/// # Examples
///
/// ```
/// use bora_core::types::ContractId;
///
/// let contract = ContractId::new("T2303").unwrap();
/// assert_eq!(contract.as_str(), "T2303");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    /// Creates a new `ContractId` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyContractId` if the string is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyContractId);
        }
        Ok(Self(s))
    }

    /// Creates a new `ContractId` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is non-empty.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the contract ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContractId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ContractId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ContractId> for String {
    fn from(id: ContractId) -> Self {
        id.0
    }
}

/// Product ID type - identifies the product family a contract belongs to
/// (e.g. all "T23xx" contracts map to product "T10Y").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new `ProductId` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyProductId` if the string is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyProductId);
        }
        Ok(Self(s))
    }

    /// Creates a new `ProductId` without validation.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the product ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Exchange ID type - identifies the venue a contract trades on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    /// Creates a new `ExchangeId` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyExchangeId` if the string is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyExchangeId);
        }
        Ok(Self(s))
    }

    /// Creates a new `ExchangeId` without validation.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the exchange ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ExchangeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Account group ID type - identifies a group of related accounts that
/// share aggregate limits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountGroupId(String);

impl AccountGroupId {
    /// Creates a new `AccountGroupId` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyAccountGroupId` if the string is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyAccountGroupId);
        }
        Ok(Self(s))
    }

    /// Creates a new `AccountGroupId` without validation.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the account group ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountGroupId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Order ID - numeric identifier assigned by the upstream gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Creates a new `OrderId`.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Trade ID - numeric identifier assigned by the matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct TradeId(u64);

impl TradeId {
    /// Creates a new `TradeId`.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TradeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Cancel ID - numeric identifier of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CancelId(u64);

impl CancelId {
    /// Creates a new `CancelId`.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CancelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CancelId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_new_valid() {
        let account = AccountId::new("ACC_001").unwrap();
        assert_eq!(account.as_str(), "ACC_001");
    }

    #[test]
    fn test_account_id_new_empty() {
        let result = AccountId::new("");
        assert!(matches!(result, Err(ValidationError::EmptyAccountId)));
    }

    #[test]
    fn test_contract_id_new_empty() {
        let result = ContractId::new("");
        assert!(matches!(result, Err(ValidationError::EmptyContractId)));
    }

    #[test]
    fn test_account_id_display() {
        let account = AccountId::new("ACC_007").unwrap();
        assert_eq!(format!("{account}"), "ACC_007");
    }

    #[test]
    fn test_order_id_roundtrip() {
        let oid = OrderId::new(42);
        assert_eq!(oid.as_u64(), 42);
        assert_eq!(OrderId::from(42), oid);
    }

    #[test]
    fn test_account_id_serde_roundtrip() {
        let account = AccountId::new("ACC_SERDE").unwrap();
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, "\"ACC_SERDE\"");
        let parsed: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(account, parsed);
    }

    #[test]
    fn test_order_id_serde_transparent() {
        let oid = OrderId::new(7);
        let json = serde_json::to_string(&oid).unwrap();
        assert_eq!(json, "7");
    }
}
