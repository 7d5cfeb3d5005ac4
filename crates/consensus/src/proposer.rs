//! Single-proposer block assembly.
//!
//! One node holds the proposer key and is the only producer of blocks. There
//! is no rotation, voting or fork choice.

use blocker_core::{Address, Block, Hash, Keypair, PublicKey, Transaction};

/// Assembles and signs blocks with a fixed key.
#[derive(Debug, Clone)]
pub struct BlockProposer {
    keypair: Keypair,
}

impl BlockProposer {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key
    }

    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// Build a block on top of `prev_hash` holding `transactions` in order,
    /// then set its Merkle root and sign it.
    pub fn propose(&self, prev_hash: Hash, transactions: Vec<Transaction>) -> Block {
        Block::new(prev_hash, transactions).signed(&self.keypair)
    }
}
