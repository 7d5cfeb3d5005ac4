//! Transaction and block validation rules.
//!
//! Everything here is a pure function of the block or transaction plus the
//! few values the caller passes in (current top hash, accumulated input
//! amount).

use blocker_core::{Block, CryptoError, Hash, Transaction, TransactionError, UtxoKey};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("block merkle root does not match its transactions")]
    InvalidMerkleRoot,

    #[error("invalid block signature: {0}")]
    InvalidBlockSignature(#[source] CryptoError),

    #[error("invalid previous block hash (expected {expected}, got {got})")]
    InvalidPrevHash { expected: Hash, got: Hash },

    #[error("transaction {tx}: {source}")]
    InvalidTransaction {
        tx: Hash,
        #[source]
        source: TransactionError,
    },

    #[error("duplicate transaction {0} in block")]
    DuplicateTransaction(Hash),

    #[error("output {key} is spent twice")]
    DuplicateSpend { key: String },

    #[error("insufficient balance: input sum ({inputs}), output sum ({outputs})")]
    InsufficientBalance { inputs: u64, outputs: u64 },

    #[error("amount overflow in transaction {0}")]
    AmountOverflow(Hash),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Transaction validator.
pub struct TransactionValidator;

impl TransactionValidator {
    /// Every input must carry a valid signature over the content hash.
    pub fn validate_signatures(tx: &Transaction) -> Result<()> {
        tx.verify()
            .map_err(|source| ValidationError::InvalidTransaction {
                tx: tx.hash(),
                source,
            })
    }

    /// No two inputs of one transaction may reference the same output.
    pub fn validate_unique_inputs(tx: &Transaction) -> Result<()> {
        let mut seen = HashSet::new();
        for input in &tx.inputs {
            let key = UtxoKey::spent_by(input);
            if !seen.insert(key) {
                return Err(ValidationError::DuplicateSpend {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Outputs may not exceed `input_total`. A residual is allowed.
    pub fn validate_balance(tx: &Transaction, input_total: u64) -> Result<()> {
        let outputs = tx
            .output_total()
            .ok_or_else(|| ValidationError::AmountOverflow(tx.hash()))?;
        if input_total < outputs {
            return Err(ValidationError::InsufficientBalance {
                inputs: input_total,
                outputs,
            });
        }
        Ok(())
    }
}

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// Merkle root (when there are transactions), proposer signature, and
    /// no transaction or spent output appearing twice.
    pub fn validate_structure(block: &Block) -> Result<()> {
        if !block.transactions.is_empty() && !block.verify_root_hash() {
            return Err(ValidationError::InvalidMerkleRoot);
        }

        block
            .verify_signature()
            .map_err(ValidationError::InvalidBlockSignature)?;

        let mut seen_txs = HashSet::new();
        let mut seen_spends = HashSet::new();
        for tx in &block.transactions {
            let hash = tx.hash();
            if !seen_txs.insert(hash) {
                return Err(ValidationError::DuplicateTransaction(hash));
            }
            for input in &tx.inputs {
                let key = UtxoKey::spent_by(input);
                if !seen_spends.insert(key) {
                    return Err(ValidationError::DuplicateSpend {
                        key: key.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// The block must sit directly on top of `top_hash`.
    pub fn validate_extends(block: &Block, top_hash: &Hash) -> Result<()> {
        if block.header.prev_hash != *top_hash {
            return Err(ValidationError::InvalidPrevHash {
                expected: *top_hash,
                got: block.header.prev_hash,
            });
        }
        Ok(())
    }
}
