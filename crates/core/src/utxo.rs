//! Unspent output records.

use crate::hash::Hash;
use crate::transaction::TxInput;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one output: producing transaction plus output index.
///
/// Displays as `<hex tx hash>-<index>`, the key used by UTXO stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtxoKey {
    pub tx_hash: Hash,
    pub index: u32,
}

impl UtxoKey {
    pub fn new(tx_hash: Hash, index: u32) -> Self {
        Self { tx_hash, index }
    }

    /// The output an input consumes.
    pub fn spent_by(input: &TxInput) -> Self {
        Self::new(input.prev_tx_hash, input.prev_out_index)
    }
}

impl fmt::Display for UtxoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tx_hash.to_hex(), self.index)
    }
}

/// A transaction output tracked by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_hash: Hash,
    pub out_index: u32,
    pub amount: u64,
    pub spent: bool,
}

impl Utxo {
    pub fn new(tx_hash: Hash, out_index: u32, amount: u64) -> Self {
        Self {
            tx_hash,
            out_index,
            amount,
            spent: false,
        }
    }

    pub fn key(&self) -> UtxoKey {
        UtxoKey::new(self.tx_hash, self.out_index)
    }
}
