//! Transaction mempool for pending transactions.
//!
//! Membership is the network's only duplicate suppression: a transaction is
//! gossiped onward only when [`Mempool::add`] reports it as new.

use blocker_core::{Hash, Transaction};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Pending transactions keyed by content hash.
#[derive(Debug, Default)]
pub struct Mempool {
    transactions: RwLock<HashMap<Hash, Transaction>>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }

    /// Is this transaction's hash known?
    pub fn has(&self, tx: &Transaction) -> bool {
        self.contains(&tx.hash())
    }

    pub fn contains(&self, tx_hash: &Hash) -> bool {
        self.transactions.read().contains_key(tx_hash)
    }

    pub fn get(&self, tx_hash: &Hash) -> Option<Transaction> {
        self.transactions.read().get(tx_hash).cloned()
    }

    /// Insert `tx`; returns false if its hash was already present.
    ///
    /// Check and insert happen under one write lock, so of several
    /// concurrent adds of the same transaction exactly one returns true.
    pub fn add(&self, tx: Transaction) -> bool {
        let hash = tx.hash();
        let mut transactions = self.transactions.write();
        if transactions.contains_key(&hash) {
            return false;
        }
        transactions.insert(hash, tx);
        true
    }

    pub fn remove(&self, tx_hash: &Hash) -> Option<Transaction> {
        self.transactions.write().remove(tx_hash)
    }

    /// Copy of every pending transaction, for use outside the lock.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.read().values().cloned().collect()
    }

    /// Empty the pool and return what it held.
    pub fn clear(&self) -> Vec<Transaction> {
        std::mem::take(&mut *self.transactions.write())
            .into_values()
            .collect()
    }
}
