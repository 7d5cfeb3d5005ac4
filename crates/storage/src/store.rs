//! Storage contracts consumed by the chain.

use blocker_core::{Block, Transaction, Utxo};
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
}

impl StorageError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Transactions keyed by hex content hash.
pub trait TxStore: Send + Sync {
    fn put(&self, tx: &Transaction) -> Result<()>;
    fn get(&self, hash: &str) -> Result<Transaction>;
}

/// Blocks keyed by hex header hash.
pub trait BlockStore: Send + Sync {
    fn put(&self, block: &Block) -> Result<()>;
    fn get(&self, hash: &str) -> Result<Block>;

    fn contains(&self, hash: &str) -> Result<bool> {
        match self.get(hash) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Unspent records keyed by [`blocker_core::UtxoKey`]'s display form.
///
/// `put` overwrites, which is how a record is marked spent.
pub trait UtxoStore: Send + Sync {
    fn put(&self, utxo: &Utxo) -> Result<()>;
    fn get(&self, key: &str) -> Result<Utxo>;
}
