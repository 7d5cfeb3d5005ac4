//! In-memory reference stores.
//!
//! One map per store, guarded by a single reader/writer lock. The lock is
//! only held for the map access itself.

use crate::store::{BlockStore, Result, StorageError, TxStore, UtxoStore};
use blocker_core::{Block, Transaction, Utxo};
use parking_lot::RwLock;
use std::collections::HashMap;

/// A string-keyed map behind a reader/writer lock.
#[derive(Debug)]
pub struct MemoryStore<T> {
    data: RwLock<HashMap<String, T>>,
}

pub type MemoryTxStore = MemoryStore<Transaction>;
pub type MemoryBlockStore = MemoryStore<Block>;
pub type MemoryUtxoStore = MemoryStore<Utxo>;

impl<T: Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn insert(&self, key: String, value: T) {
        self.data.write().insert(key, value);
    }

    fn lookup(&self, kind: &'static str, key: &str) -> Result<T> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(kind, key))
    }
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl TxStore for MemoryStore<Transaction> {
    fn put(&self, tx: &Transaction) -> Result<()> {
        self.insert(tx.hash().to_hex(), tx.clone());
        Ok(())
    }

    fn get(&self, hash: &str) -> Result<Transaction> {
        self.lookup("transaction", hash)
    }
}

impl BlockStore for MemoryStore<Block> {
    fn put(&self, block: &Block) -> Result<()> {
        self.insert(block.hash().to_hex(), block.clone());
        Ok(())
    }

    fn get(&self, hash: &str) -> Result<Block> {
        self.lookup("block", hash)
    }

    fn contains(&self, hash: &str) -> Result<bool> {
        Ok(self.data.read().contains_key(hash))
    }
}

impl UtxoStore for MemoryStore<Utxo> {
    fn put(&self, utxo: &Utxo) -> Result<()> {
        self.insert(utxo.key().to_string(), utxo.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Utxo> {
        self.lookup("utxo", key)
    }
}
