//! Ledger state and mempool for blocker.
//!
//! This crate brings the lower layers together:
//! - **Chain**: header sequence, stores, validation and commit
//! - **Mempool**: pending transactions keyed by content hash
//! - **Genesis**: the fixed first block every node starts from
//!
//! # Example
//!
//! ```rust
//! use blocker_chain::{genesis_keypair, Chain};
//! use blocker_consensus::BlockProposer;
//! use blocker_core::{Transaction, TxInput, TxOutput, UtxoKey};
//!
//! let chain = Chain::new().unwrap();
//! assert_eq!(chain.height(), 0);
//!
//! // spend the genesis output
//! let owner = genesis_keypair();
//! let genesis_tx = chain.get_block_by_height(0).unwrap().transactions[0].hash();
//! let tx = Transaction::new(
//!     vec![TxInput::new(genesis_tx, 0, owner.public_key)],
//!     vec![TxOutput::new(400, owner.address())],
//! )
//! .signed(&owner);
//!
//! let block = BlockProposer::new(owner).propose(chain.top_hash(), vec![tx]);
//! chain.add_block(block).unwrap();
//!
//! assert_eq!(chain.height(), 1);
//! assert!(chain.get_utxo(&UtxoKey::new(genesis_tx, 0)).unwrap().spent);
//! ```

pub mod chain;
pub mod genesis;
pub mod mempool;

// Re-export commonly used types
pub use chain::{Chain, ChainError, Result};
pub use genesis::{genesis_block, genesis_keypair, GENESIS_SEED, GENESIS_SUPPLY};
pub use mempool::Mempool;
