//! Processing directives emitted by rules.
//!
//! An [`ActionKind`] names the directive; the engine pairs it with the
//! originating rule and event before handing it to the sink. Suspend/resume
//! kinds form [`ActionFamily`] pairs whose delivery is deduplicated by a
//! per-subject latch; standalone kinds are always forwarded.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dimensions::DimensionKey;
use crate::types::{AccountId, ContractId, ProductId};

/// Directive kinds dispatched to downstream matching/gateway components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Halt all trading for an account.
    SuspendAccountTrading,
    /// Re-enable trading for an account.
    ResumeAccountTrading,
    /// Halt order submission for an account.
    SuspendOrdering,
    /// Re-enable order submission for an account.
    ResumeOrdering,
    /// Halt trading in one contract.
    SuspendContract,
    /// Re-enable trading in one contract.
    ResumeContract,
    /// Halt trading in one product.
    SuspendProduct,
    /// Re-enable trading in one product.
    ResumeProduct,
    /// Reject the triggering order.
    BlockOrder,
    /// Reject the triggering cancel.
    BlockCancel,
    /// Raise an operator alert.
    Alert,
    /// Request position reduction.
    ReducePosition,
    /// Request a margin increase.
    IncreaseMargin,
}

impl ActionKind {
    /// Returns the suspend/resume pair this kind belongs to, if any.
    ///
    /// Standalone kinds (alerts, blocks, position directives) return `None`
    /// and bypass the dedup latch.
    #[must_use]
    pub const fn latch_edge(&self) -> Option<(ActionFamily, LatchDirection)> {
        match self {
            Self::SuspendAccountTrading => {
                Some((ActionFamily::AccountTrading, LatchDirection::Suspend))
            }
            Self::ResumeAccountTrading => {
                Some((ActionFamily::AccountTrading, LatchDirection::Resume))
            }
            Self::SuspendOrdering => Some((ActionFamily::Ordering, LatchDirection::Suspend)),
            Self::ResumeOrdering => Some((ActionFamily::Ordering, LatchDirection::Resume)),
            Self::SuspendContract => Some((ActionFamily::Contract, LatchDirection::Suspend)),
            Self::ResumeContract => Some((ActionFamily::Contract, LatchDirection::Resume)),
            Self::SuspendProduct => Some((ActionFamily::Product, LatchDirection::Suspend)),
            Self::ResumeProduct => Some((ActionFamily::Product, LatchDirection::Resume)),
            Self::BlockOrder
            | Self::BlockCancel
            | Self::Alert
            | Self::ReducePosition
            | Self::IncreaseMargin => None,
        }
    }

    /// Returns true for suspend-side kinds of a latch pair.
    #[must_use]
    pub const fn is_suspend(&self) -> bool {
        matches!(
            self.latch_edge(),
            Some((_, LatchDirection::Suspend))
        )
    }

    /// Derives the latch subject for this kind from the originating key.
    ///
    /// Returns `None` when the key lacks the components the kind targets;
    /// the engine treats such actions as standalone (forwarded, not latched).
    #[must_use]
    pub fn subject(&self, key: &DimensionKey) -> Option<Subject> {
        let family = self.latch_edge()?.0;
        match family {
            ActionFamily::AccountTrading | ActionFamily::Ordering => {
                key.account.clone().map(Subject::Account)
            }
            ActionFamily::Contract => match (key.account.clone(), key.contract.clone()) {
                (Some(account), Some(contract)) => {
                    Some(Subject::AccountContract(account, contract))
                }
                (None, Some(contract)) => Some(Subject::Contract(contract)),
                _ => None,
            },
            ActionFamily::Product => match (key.account.clone(), key.product.clone()) {
                (Some(account), Some(product)) => Some(Subject::AccountProduct(account, product)),
                (None, Some(product)) => Some(Subject::Product(product)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SuspendAccountTrading => "SUSPEND_ACCOUNT_TRADING",
            Self::ResumeAccountTrading => "RESUME_ACCOUNT_TRADING",
            Self::SuspendOrdering => "SUSPEND_ORDERING",
            Self::ResumeOrdering => "RESUME_ORDERING",
            Self::SuspendContract => "SUSPEND_CONTRACT",
            Self::ResumeContract => "RESUME_CONTRACT",
            Self::SuspendProduct => "SUSPEND_PRODUCT",
            Self::ResumeProduct => "RESUME_PRODUCT",
            Self::BlockOrder => "BLOCK_ORDER",
            Self::BlockCancel => "BLOCK_CANCEL",
            Self::Alert => "ALERT",
            Self::ReducePosition => "REDUCE_POSITION",
            Self::IncreaseMargin => "INCREASE_MARGIN",
        };
        write!(f, "{name}")
    }
}

/// Suspend/resume action families sharing one latch per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionFamily {
    /// Account-wide trading halt.
    AccountTrading,
    /// Order-submission halt.
    Ordering,
    /// Single-contract halt.
    Contract,
    /// Single-product halt.
    Product,
}

impl fmt::Display for ActionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountTrading => write!(f, "account_trading"),
            Self::Ordering => write!(f, "ordering"),
            Self::Contract => write!(f, "contract"),
            Self::Product => write!(f, "product"),
        }
    }
}

/// Which direction a paired action drives its latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchDirection {
    /// ALLOWED → SUSPENDED edge.
    Suspend,
    /// SUSPENDED → ALLOWED edge.
    Resume,
}

/// The target of a latched action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    /// A whole account.
    Account(AccountId),
    /// One contract within an account.
    AccountContract(AccountId, ContractId),
    /// One product within an account.
    AccountProduct(AccountId, ProductId),
    /// A contract across all accounts.
    Contract(ContractId),
    /// A product across all accounts.
    Product(ProductId),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(a) => write!(f, "account:{a}"),
            Self::AccountContract(a, c) => write!(f, "account:{a}/contract:{c}"),
            Self::AccountProduct(a, p) => write!(f, "account:{a}/product:{p}"),
            Self::Contract(c) => write!(f, "contract:{c}"),
            Self::Product(p) => write!(f, "product:{p}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountId;

    fn key_with_account() -> DimensionKey {
        DimensionKey {
            account: Some(AccountId::new_unchecked("A")),
            ..DimensionKey::empty()
        }
    }

    #[test]
    fn test_latch_edges_pair_up() {
        let (family, dir) = ActionKind::SuspendOrdering.latch_edge().unwrap();
        assert_eq!(family, ActionFamily::Ordering);
        assert_eq!(dir, LatchDirection::Suspend);

        let (family, dir) = ActionKind::ResumeOrdering.latch_edge().unwrap();
        assert_eq!(family, ActionFamily::Ordering);
        assert_eq!(dir, LatchDirection::Resume);
    }

    #[test]
    fn test_standalone_kinds_have_no_edge() {
        assert!(ActionKind::Alert.latch_edge().is_none());
        assert!(ActionKind::BlockOrder.latch_edge().is_none());
        assert!(ActionKind::BlockCancel.latch_edge().is_none());
        assert!(ActionKind::ReducePosition.latch_edge().is_none());
        assert!(ActionKind::IncreaseMargin.latch_edge().is_none());
    }

    #[test]
    fn test_account_subject() {
        let subject = ActionKind::SuspendAccountTrading
            .subject(&key_with_account())
            .unwrap();
        assert_eq!(subject, Subject::Account(AccountId::new_unchecked("A")));
    }

    #[test]
    fn test_contract_subject_prefers_account_scope() {
        let mut key = key_with_account();
        key.contract = Some(crate::types::ContractId::new_unchecked("T2303"));
        let subject = ActionKind::SuspendContract.subject(&key).unwrap();
        assert!(matches!(subject, Subject::AccountContract(_, _)));
    }

    #[test]
    fn test_subject_absent_when_components_missing() {
        let key = DimensionKey::empty();
        assert!(ActionKind::SuspendAccountTrading.subject(&key).is_none());
        assert!(ActionKind::SuspendProduct.subject(&key).is_none());
    }

    #[test]
    fn test_display_matches_wire_names() {
        assert_eq!(
            ActionKind::SuspendAccountTrading.to_string(),
            "SUSPEND_ACCOUNT_TRADING"
        );
        assert_eq!(ActionKind::Alert.to_string(), "ALERT");
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&ActionKind::SuspendOrdering).unwrap(),
            "\"SUSPEND_ORDERING\""
        );
    }
}
