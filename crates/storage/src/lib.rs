//! Pluggable storage layer for blocker.
//!
//! The chain persists three kinds of records, each behind its own trait:
//! - [`TxStore`]: transactions keyed by hex content hash
//! - [`BlockStore`]: blocks keyed by hex header hash
//! - [`UtxoStore`]: unspent records keyed by `<hex tx hash>-<index>`
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Chain                      │
//! └──────┬──────────────┬───────────────┬────────┘
//!        │              │               │
//! ┌──────▼─────┐ ┌──────▼──────┐ ┌──────▼──────┐
//! │  TxStore   │ │ BlockStore  │ │  UtxoStore  │
//! └──────┬─────┘ └──────┬──────┘ └──────┬──────┘
//!        │              │               │
//! ┌──────▼──────────────▼───────────────▼──────┐
//! │   MemoryStore<T>  (one RwLock per store)   │
//! └────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use blocker_core::{Address, Transaction};
//! use blocker_storage::{MemoryTxStore, TxStore};
//!
//! let store = MemoryTxStore::new();
//! let tx = Transaction::mint(Address::default(), 10);
//! store.put(&tx).unwrap();
//! assert_eq!(store.get(&tx.hash().to_hex()).unwrap(), tx);
//! ```

pub mod memory;
pub mod store;

// Re-export commonly used types
pub use memory::{MemoryBlockStore, MemoryStore, MemoryTxStore, MemoryUtxoStore};
pub use store::{BlockStore, Result, StorageError, TxStore, UtxoStore};
