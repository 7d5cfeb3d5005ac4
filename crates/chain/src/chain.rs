//! The append-only chain.
//!
//! `Chain` owns the three stores and the header sequence. Block validation
//! and commit run under one commit lock, so heights are assigned strictly
//! in order even when blocks arrive from several connections at once.

use crate::genesis::genesis_block;
use blocker_consensus::{BlockValidator, TransactionValidator, ValidationError};
use blocker_core::{Block, Hash, Header, Transaction, Utxo, UtxoKey};
use blocker_storage::{
    BlockStore, MemoryBlockStore, MemoryTxStore, MemoryUtxoStore, StorageError, TxStore,
    UtxoStore,
};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("height {height} is above the chain height {top}")]
    HeightOutOfRange { height: u64, top: u64 },

    #[error("input {input}: unspent output {key} not found")]
    UtxoNotFound { input: usize, key: String },

    #[error("input {input}: output {key} is already spent")]
    AlreadySpent { input: usize, key: String },

    #[error("input {input}: key does not own output {key}")]
    NotOwner { input: usize, key: String },
}

impl ChainError {
    /// Missing block, transaction, unspent record or height.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_not_found(),
            Self::HeightOutOfRange { .. } | Self::UtxoNotFound { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;

pub struct Chain {
    tx_store: Box<dyn TxStore>,
    block_store: Box<dyn BlockStore>,
    utxo_store: Box<dyn UtxoStore>,
    headers: RwLock<Vec<Header>>,
    commit_lock: Mutex<()>,
}

impl Chain {
    /// A chain over the in-memory stores, holding only genesis.
    pub fn new() -> Result<Self> {
        Self::with_stores(
            Box::new(MemoryTxStore::new()),
            Box::new(MemoryBlockStore::new()),
            Box::new(MemoryUtxoStore::new()),
        )
    }

    /// A chain over caller-supplied stores. Genesis is committed without
    /// validation.
    pub fn with_stores(
        tx_store: Box<dyn TxStore>,
        block_store: Box<dyn BlockStore>,
        utxo_store: Box<dyn UtxoStore>,
    ) -> Result<Self> {
        let chain = Self {
            tx_store,
            block_store,
            utxo_store,
            headers: RwLock::new(Vec::new()),
            commit_lock: Mutex::new(()),
        };
        let genesis = genesis_block();
        chain.commit(&genesis)?;
        info!(hash = %genesis.hash(), "genesis committed");
        Ok(chain)
    }

    /// Number of headers minus one; genesis is height 0.
    pub fn height(&self) -> u64 {
        self.headers.read().len() as u64 - 1
    }

    /// Hash of the newest header.
    pub fn top_hash(&self) -> Hash {
        self.headers
            .read()
            .last()
            .map(Header::hash)
            .unwrap_or(Hash::ZERO)
    }

    pub fn get_block_by_height(&self, height: u64) -> Result<Block> {
        let hash = {
            let headers = self.headers.read();
            let top = headers.len() as u64 - 1;
            let header = usize::try_from(height)
                .ok()
                .and_then(|h| headers.get(h))
                .ok_or(ChainError::HeightOutOfRange { height, top })?;
            header.hash()
        };
        self.get_block_by_hash(&hash)
    }

    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Block> {
        Ok(self.block_store.get(&hash.to_hex())?)
    }

    pub fn has_block(&self, hash: &Hash) -> Result<bool> {
        Ok(self.block_store.contains(&hash.to_hex())?)
    }

    pub fn get_transaction(&self, hash: &Hash) -> Result<Transaction> {
        Ok(self.tx_store.get(&hash.to_hex())?)
    }

    pub fn get_utxo(&self, key: &UtxoKey) -> Result<Utxo> {
        Ok(self.utxo_store.get(&key.to_string())?)
    }

    /// Validate `block` against the current top and commit it.
    pub fn add_block(&self, block: Block) -> Result<()> {
        let _guard = self.commit_lock.lock();

        if let Err(e) = self.validate_block(&block) {
            debug!(hash = %block.hash(), error = %e, "block rejected");
            return Err(e);
        }
        self.commit(&block)?;

        info!(
            height = self.height(),
            hash = %block.hash(),
            txs = block.transactions.len(),
            "block committed"
        );
        Ok(())
    }

    /// Structure, linkage to the current top, then every transaction.
    pub fn validate_block(&self, block: &Block) -> Result<()> {
        BlockValidator::validate_structure(block)?;
        BlockValidator::validate_extends(block, &self.top_hash())?;
        for tx in &block.transactions {
            self.validate_transaction(tx)?;
        }
        Ok(())
    }

    /// Signatures, then each input's unspent record and owner, then the
    /// balance rule.
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<()> {
        TransactionValidator::validate_signatures(tx)?;
        TransactionValidator::validate_unique_inputs(tx)?;

        let mut input_total: u64 = 0;
        for (index, input) in tx.inputs.iter().enumerate() {
            let key = UtxoKey::spent_by(input).to_string();
            let utxo = match self.utxo_store.get(&key) {
                Ok(utxo) => utxo,
                Err(e) if e.is_not_found() => {
                    return Err(ChainError::UtxoNotFound { input: index, key });
                }
                Err(e) => return Err(e.into()),
            };
            if utxo.spent {
                return Err(ChainError::AlreadySpent { input: index, key });
            }
            let owner = self
                .tx_store
                .get(&input.prev_tx_hash.to_hex())?
                .outputs
                .get(input.prev_out_index as usize)
                .map(|output| output.address);
            match owner {
                None => return Err(ChainError::UtxoNotFound { input: index, key }),
                Some(address) if address != input.public_key.to_address() => {
                    return Err(ChainError::NotOwner { input: index, key });
                }
                Some(_) => {}
            }
            input_total = input_total
                .checked_add(utxo.amount)
                .ok_or_else(|| ValidationError::AmountOverflow(tx.hash()))?;
        }

        TransactionValidator::validate_balance(tx, input_total)?;
        Ok(())
    }

    // Header first, then transactions and their outputs, then the block.
    fn commit(&self, block: &Block) -> Result<()> {
        self.headers.write().push(block.header.clone());

        for tx in &block.transactions {
            let hash = tx.hash();
            self.tx_store.put(tx)?;

            for (index, output) in tx.outputs.iter().enumerate() {
                self.utxo_store
                    .put(&Utxo::new(hash, index as u32, output.amount))?;
            }

            for input in &tx.inputs {
                let mut utxo = self.utxo_store.get(&UtxoKey::spent_by(input).to_string())?;
                utxo.spent = true;
                self.utxo_store.put(&utxo)?;
            }
        }

        self.block_store.put(block)?;
        Ok(())
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("height", &self.height())
            .field("top", &self.top_hash())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::{genesis_keypair, GENESIS_SUPPLY};
    use blocker_consensus::BlockProposer;
    use blocker_core::{Address, Keypair, TransactionError, TxInput, TxOutput};

    fn genesis_tx_hash(chain: &Chain) -> Hash {
        chain.get_block_by_height(0).unwrap().transactions[0].hash()
    }

    fn spend_genesis(chain: &Chain, amount: u64) -> Transaction {
        let owner = genesis_keypair();
        Transaction::new(
            vec![TxInput::new(genesis_tx_hash(chain), 0, owner.public_key)],
            vec![TxOutput::new(amount, Address::default())],
        )
        .signed(&owner)
    }

    fn propose(chain: &Chain, txs: Vec<Transaction>) -> Block {
        BlockProposer::new(genesis_keypair()).propose(chain.top_hash(), txs)
    }

    #[test]
    fn test_new_chain_holds_genesis() {
        let chain = Chain::new().unwrap();

        assert_eq!(chain.height(), 0);
        let genesis = chain.get_block_by_height(0).unwrap();
        assert_eq!(genesis.hash(), chain.top_hash());
        assert_eq!(chain.get_block_by_hash(&genesis.hash()).unwrap(), genesis);

        let utxo = chain
            .get_utxo(&UtxoKey::new(genesis_tx_hash(&chain), 0))
            .unwrap();
        assert_eq!(utxo.amount, GENESIS_SUPPLY);
        assert!(!utxo.spent);
    }

    #[test]
    fn test_height_out_of_range() {
        let chain = Chain::new().unwrap();
        let err = chain.get_block_by_height(1).unwrap_err();

        assert!(err.is_not_found());
        assert!(matches!(
            err,
            ChainError::HeightOutOfRange { height: 1, top: 0 }
        ));
        assert!(chain.get_block_by_height(u64::MAX).is_err());
    }

    #[test]
    fn test_unknown_block_hash_not_found() {
        let chain = Chain::new().unwrap();
        let err = chain.get_block_by_hash(&Hash::ZERO).unwrap_err();
        assert!(err.is_not_found());
        assert!(!chain.has_block(&Hash::ZERO).unwrap());
    }

    #[test]
    fn test_add_empty_block() {
        let chain = Chain::new().unwrap();
        let block = propose(&chain, vec![]);
        let hash = block.hash();

        chain.add_block(block).unwrap();
        assert_eq!(chain.height(), 1);
        assert_eq!(chain.top_hash(), hash);
        assert_eq!(chain.get_block_by_height(1).unwrap().hash(), hash);
    }

    #[test]
    fn test_valid_spend_accepted() {
        let chain = Chain::new().unwrap();
        assert!(chain.validate_transaction(&spend_genesis(&chain, 1000)).is_ok());
        assert!(chain.validate_transaction(&spend_genesis(&chain, 10)).is_ok());
    }

    #[test]
    fn test_overspend_rejected() {
        let chain = Chain::new().unwrap();
        let err = chain
            .validate_transaction(&spend_genesis(&chain, 1001))
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::Validation(ValidationError::InsufficientBalance {
                inputs: 1000,
                outputs: 1001
            })
        ));
    }

    #[test]
    fn test_unknown_output_rejected() {
        let chain = Chain::new().unwrap();
        let kp = Keypair::generate();
        let tx = Transaction::new(
            vec![TxInput::new(Hash::ZERO, 3, kp.public_key)],
            vec![TxOutput::new(1, Address::default())],
        )
        .signed(&kp);

        match chain.validate_transaction(&tx).unwrap_err() {
            ChainError::UtxoNotFound { input, key } => {
                assert_eq!(input, 0);
                assert_eq!(key, UtxoKey::new(Hash::ZERO, 3).to_string());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let chain = Chain::new().unwrap();
        let thief = Keypair::generate();
        let mut tx = Transaction::new(
            vec![TxInput::new(genesis_tx_hash(&chain), 0, genesis_keypair().public_key)],
            vec![TxOutput::new(1000, thief.address())],
        );
        let sig = thief.sign_hash(&tx.hash());
        tx.inputs[0].signature = Some(sig);

        assert!(matches!(
            chain.validate_transaction(&tx).unwrap_err(),
            ChainError::Validation(ValidationError::InvalidTransaction {
                source: TransactionError::InvalidSignature { input: 0 },
                ..
            })
        ));
    }

    #[test]
    fn test_foreign_key_cannot_spend() {
        let chain = Chain::new().unwrap();
        let thief = Keypair::generate();
        let tx = Transaction::new(
            vec![TxInput::new(genesis_tx_hash(&chain), 0, thief.public_key)],
            vec![TxOutput::new(1000, thief.address())],
        )
        .signed(&thief);

        match chain.validate_transaction(&tx).unwrap_err() {
            ChainError::NotOwner { input, key } => {
                assert_eq!(input, 0);
                assert_eq!(key, UtxoKey::new(genesis_tx_hash(&chain), 0).to_string());
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            chain.add_block(propose(&chain, vec![tx])).unwrap_err(),
            ChainError::NotOwner { .. }
        ));
        assert_eq!(chain.height(), 0);
        assert!(!chain
            .get_utxo(&UtxoKey::new(genesis_tx_hash(&chain), 0))
            .unwrap()
            .spent);
    }

    #[test]
    fn test_commit_marks_spent_and_creates_outputs() {
        let chain = Chain::new().unwrap();
        let tx = spend_genesis(&chain, 600);
        let tx_hash = tx.hash();

        chain.add_block(propose(&chain, vec![tx.clone()])).unwrap();

        assert!(chain
            .get_utxo(&UtxoKey::new(genesis_tx_hash(&chain), 0))
            .unwrap()
            .spent);
        let created = chain.get_utxo(&UtxoKey::new(tx_hash, 0)).unwrap();
        assert_eq!(created.amount, 600);
        assert!(!created.spent);
        assert_eq!(chain.get_transaction(&tx_hash).unwrap(), tx);

        let again = spend_genesis(&chain, 1);
        assert!(matches!(
            chain.validate_transaction(&again).unwrap_err(),
            ChainError::AlreadySpent { input: 0, .. }
        ));
    }

    #[test]
    fn test_wrong_parent_rejected_without_commit() {
        let chain = Chain::new().unwrap();
        let block = BlockProposer::new(genesis_keypair()).propose(Hash::ZERO, vec![]);

        assert!(matches!(
            chain.add_block(block).unwrap_err(),
            ChainError::Validation(ValidationError::InvalidPrevHash { .. })
        ));
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn test_rejected_block_leaves_no_trace() {
        let chain = Chain::new().unwrap();
        let good = spend_genesis(&chain, 100);
        let bad = spend_genesis(&chain, 5000);
        let good_hash = good.hash();

        assert!(chain.add_block(propose(&chain, vec![good, bad])).is_err());
        assert_eq!(chain.height(), 0);
        assert!(chain.get_transaction(&good_hash).unwrap_err().is_not_found());
        assert!(!chain
            .get_utxo(&UtxoKey::new(genesis_tx_hash(&chain), 0))
            .unwrap()
            .spent);
    }

    #[test]
    fn test_mint_after_genesis_rejected() {
        let chain = Chain::new().unwrap();
        let block = propose(&chain, vec![Transaction::mint(Address::default(), 5)]);
        assert!(matches!(
            chain.add_block(block).unwrap_err(),
            ChainError::Validation(ValidationError::InsufficientBalance { inputs: 0, .. })
        ));
    }
}
