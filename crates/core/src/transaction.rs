//! UTXO transactions and their signing domain.
//!
//! A transaction's identity is the digest of its encoding with every input
//! signature cleared. The same digest is what each input signs, so adding
//! signatures never changes the hash and every input is checked against one
//! well-defined message.

use crate::crypto::{Address, Keypair, PublicKey, Signature};
use crate::hash::{content_hash, Hash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version tag written into every new transaction.
pub const TX_VERSION: u32 = 1;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("input {input} has no signature")]
    MissingSignature { input: usize },
    #[error("input {input} signature verification failed")]
    InvalidSignature { input: usize },
    #[error("input {input} does not exist")]
    NoSuchInput { input: usize },
    #[error("input {input} is owned by a different key")]
    KeyMismatch { input: usize },
}

/// Reference to an output of an earlier transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_tx_hash: Hash,
    pub prev_out_index: u32,
    /// Key of the owner spending the referenced output.
    pub public_key: PublicKey,
    /// Excluded from the signing domain.
    pub signature: Option<Signature>,
}

impl TxInput {
    pub fn new(prev_tx_hash: Hash, prev_out_index: u32, public_key: PublicKey) -> Self {
        Self {
            prev_tx_hash,
            prev_out_index,
            public_key,
            signature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub amount: u64,
    pub address: Address,
}

impl TxOutput {
    pub fn new(amount: u64, address: Address) -> Self {
        Self { amount, address }
    }
}

/// A transfer consuming unspent outputs and creating new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self {
            version: TX_VERSION,
            inputs,
            outputs,
        }
    }

    /// A transaction without inputs that credits `amount` to `to`.
    pub fn mint(to: Address, amount: u64) -> Self {
        Self::new(Vec::new(), vec![TxOutput::new(amount, to)])
    }

    /// True for transactions that spend nothing (genesis supply).
    pub fn is_mint(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Copy of this transaction with every input signature cleared.
    pub fn unsigned(&self) -> Self {
        let mut tx = self.clone();
        for input in &mut tx.inputs {
            input.signature = None;
        }
        tx
    }

    /// Content hash: identity of the transaction and message signed by
    /// every input.
    pub fn hash(&self) -> Hash {
        if self.inputs.iter().all(|i| i.signature.is_none()) {
            content_hash(self)
        } else {
            content_hash(&self.unsigned())
        }
    }

    /// Sign input `index`; the keypair must own the input's public key.
    pub fn sign_input(&mut self, index: usize, keypair: &Keypair) -> Result<(), TransactionError> {
        let hash = self.hash();
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(TransactionError::NoSuchInput { input: index })?;
        if input.public_key != keypair.public_key {
            return Err(TransactionError::KeyMismatch { input: index });
        }
        input.signature = Some(keypair.sign_hash(&hash));
        Ok(())
    }

    /// Sign every input owned by `keypair`.
    pub fn sign(&mut self, keypair: &Keypair) {
        let hash = self.hash();
        for input in self
            .inputs
            .iter_mut()
            .filter(|i| i.public_key == keypair.public_key)
        {
            input.signature = Some(keypair.sign_hash(&hash));
        }
    }

    /// Create a signed transaction.
    pub fn signed(mut self, keypair: &Keypair) -> Self {
        self.sign(keypair);
        self
    }

    /// Check every input's signature against the content hash.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let hash = self.hash();
        for (index, input) in self.inputs.iter().enumerate() {
            let signature = input
                .signature
                .as_ref()
                .ok_or(TransactionError::MissingSignature { input: index })?;
            input
                .public_key
                .verify(hash.as_bytes(), signature)
                .map_err(|_| TransactionError::InvalidSignature { input: index })?;
        }
        Ok(())
    }

    /// Sum of output amounts, `None` on overflow.
    pub fn output_total(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.amount))
    }
}
