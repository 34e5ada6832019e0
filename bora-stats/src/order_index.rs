//! Bounded order-id → dimensions mapping.
//!
//! Trades and cancels often arrive without account/contract fields; this
//! index remembers recently seen orders so the engine can enrich them. The
//! index is bounded: once full, the oldest inserted order is evicted. A
//! lookup miss is not an error — the event is processed with whatever
//! fields it carries.

use crossbeam_queue::SegQueue;
use dashmap::DashMap;

use bora_core::types::{AccountId, ContractId, OrderId};

/// The dimension fields remembered per order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDims {
    /// Owning account.
    pub account_id: AccountId,
    /// Instrument.
    pub contract_id: ContractId,
}

/// Concurrent bounded mapping from order id to enrichment dimensions.
///
/// Eviction is FIFO over insertion order. Re-inserting an existing order id
/// refreshes its dimensions but keeps its original queue position, so a
/// heavily re-used id may be evicted earlier than its latest insert; the
/// enrichment contract tolerates misses, so this stays cheap.
#[derive(Debug)]
pub struct OrderIndex {
    capacity: usize,
    entries: DashMap<OrderId, OrderDims>,
    fifo: SegQueue<OrderId>,
}

impl OrderIndex {
    /// Creates an index bounded at `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: DashMap::new(),
            fifo: SegQueue::new(),
        }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records an order's dimensions, evicting the oldest entries if the
    /// index is full.
    pub fn insert(&self, oid: OrderId, account_id: AccountId, contract_id: ContractId) {
        let previous = self.entries.insert(
            oid,
            OrderDims {
                account_id,
                contract_id,
            },
        );
        if previous.is_none() {
            self.fifo.push(oid);
        }
        while self.entries.len() > self.capacity {
            match self.fifo.pop() {
                Some(old) => {
                    self.entries.remove(&old);
                }
                None => break,
            }
        }
    }

    /// Looks up the dimensions recorded for `oid`.
    #[must_use]
    pub fn get(&self, oid: OrderId) -> Option<OrderDims> {
        self.entries.get(&oid).map(|entry| entry.value().clone())
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(account: &str, contract: &str) -> (AccountId, ContractId) {
        (
            AccountId::new_unchecked(account),
            ContractId::new_unchecked(contract),
        )
    }

    #[test]
    fn test_insert_and_get() {
        let index = OrderIndex::new(16);
        let (account, contract) = dims("A", "T2303");
        index.insert(OrderId::new(1), account.clone(), contract.clone());

        let entry = index.get(OrderId::new(1)).unwrap();
        assert_eq!(entry.account_id, account);
        assert_eq!(entry.contract_id, contract);
    }

    #[test]
    fn test_miss_returns_none() {
        let index = OrderIndex::new(16);
        assert!(index.get(OrderId::new(99)).is_none());
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let index = OrderIndex::new(3);
        for i in 1..=4_u64 {
            let (account, contract) = dims("A", "T2303");
            index.insert(OrderId::new(i), account, contract);
        }
        assert_eq!(index.len(), 3);
        assert!(index.get(OrderId::new(1)).is_none());
        assert!(index.get(OrderId::new(4)).is_some());
    }

    #[test]
    fn test_reinsert_refreshes_dimensions() {
        let index = OrderIndex::new(4);
        let (account, contract) = dims("A", "T2303");
        index.insert(OrderId::new(1), account, contract);

        let (account, contract) = dims("B", "T2306");
        index.insert(OrderId::new(1), account, contract);

        assert_eq!(index.len(), 1);
        let entry = index.get(OrderId::new(1)).unwrap();
        assert_eq!(entry.account_id.as_str(), "B");
    }

    #[test]
    fn test_capacity_minimum_is_one() {
        let index = OrderIndex::new(0);
        assert_eq!(index.capacity(), 1);
        let (account, contract) = dims("A", "C1");
        index.insert(OrderId::new(1), account, contract);
        let (account, contract) = dims("A", "C2");
        index.insert(OrderId::new(2), account, contract);
        assert_eq!(index.len(), 1);
        assert!(index.get(OrderId::new(2)).is_some());
    }
}
