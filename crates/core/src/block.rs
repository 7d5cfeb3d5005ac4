//! Block and block header structures.

use crate::crypto::{CryptoError, Keypair, PublicKey, Signature};
use crate::hash::{content_hash, Hash};
use crate::merkle::merkle_root;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// Version tag written into every new header.
pub const BLOCK_VERSION: u32 = 1;

/// Block header. Height is not stored; it is the header's position in the
/// chain's header list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    /// Hash of the previous block's header.
    pub prev_hash: Hash,
    /// Merkle root of transaction hashes; zero when the block is empty.
    pub root_hash: Hash,
}

impl Header {
    /// Block hash: digest of the header fields only.
    pub fn hash(&self) -> Hash {
        content_hash(self)
    }
}

/// A header, its transactions, and the proposer's signature over the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
    pub public_key: PublicKey,
    pub signature: Signature,
}

impl Block {
    /// Create a new unsigned block on top of `prev_hash`.
    pub fn new(prev_hash: Hash, transactions: Vec<Transaction>) -> Self {
        Self {
            header: Header {
                version: BLOCK_VERSION,
                prev_hash,
                root_hash: Hash::ZERO,
            },
            transactions,
            public_key: PublicKey::default(),
            signature: Signature::default(),
        }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn tx_hashes(&self) -> Vec<Hash> {
        self.transactions.iter().map(Transaction::hash).collect()
    }

    pub fn compute_root_hash(&self) -> Hash {
        merkle_root(&self.tx_hashes())
    }

    /// Fill in the Merkle root (if there are transactions), then sign the
    /// resulting header hash.
    pub fn sign(&mut self, keypair: &Keypair) -> Signature {
        if !self.transactions.is_empty() {
            self.header.root_hash = self.compute_root_hash();
        }
        let signature = keypair.sign_hash(&self.hash());
        self.public_key = keypair.public_key;
        self.signature = signature;
        signature
    }

    /// Create a signed block.
    pub fn signed(mut self, keypair: &Keypair) -> Self {
        self.sign(keypair);
        self
    }

    /// Does the stored root match the transactions?
    pub fn verify_root_hash(&self) -> bool {
        self.compute_root_hash() == self.header.root_hash
    }

    /// Check the signature against the embedded proposer key.
    pub fn verify_signature(&self) -> Result<(), CryptoError> {
        self.public_key
            .verify(self.hash().as_bytes(), &self.signature)
    }
}
