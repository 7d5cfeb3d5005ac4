//! Core ledger primitives for blocker.
//!
//! This crate provides the fundamental types used throughout the node:
//! - Cryptographic primitives (hashing, signing, addresses)
//! - Transactions with UTXO-style inputs and outputs
//! - Blocks and block headers
//! - Unspent output records
//! - Merkle trees

pub mod block;
pub mod crypto;
pub mod hash;
pub mod merkle;
pub mod transaction;
pub mod utxo;

// Re-export commonly used types at the crate root
pub use block::{Block, Header, BLOCK_VERSION};
pub use crypto::{Address, CryptoError, Keypair, PublicKey, Signature};
pub use hash::{content_hash, digest, digest_concat, Hash, H256};
pub use merkle::{merkle_root, MerkleProof, MerkleTree};
pub use transaction::{Transaction, TransactionError, TxInput, TxOutput, TX_VERSION};
pub use utxo::{Utxo, UtxoKey};
