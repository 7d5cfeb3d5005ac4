//! Validation rules and block assembly for blocker.
//!
//! This crate holds the state-free half of consensus:
//! - Block structure checks (Merkle root, proposer signature, linkage)
//! - Transaction signature and balance checks
//! - Single-proposer block assembly and signing
//!
//! Checks that need the unspent-output set live in `blocker-chain`.
//!
//! # Example
//!
//! ```rust
//! use blocker_consensus::{BlockProposer, BlockValidator};
//! use blocker_core::{Hash, Keypair};
//!
//! let proposer = BlockProposer::new(Keypair::generate());
//! let block = proposer.propose(Hash::ZERO, vec![]);
//!
//! BlockValidator::validate_structure(&block).unwrap();
//! BlockValidator::validate_extends(&block, &Hash::ZERO).unwrap();
//! ```

pub mod proposer;
pub mod validator;

// Re-export commonly used types
pub use proposer::BlockProposer;
pub use validator::{BlockValidator, TransactionValidator, ValidationError};
