//! Peer-to-peer node for blocker.
//!
//! A [`Node`] owns a [`blocker_chain::Chain`], a mempool and a peer table,
//! and serves three remote calls over length-prefixed bincode frames on TCP:
//!
//! - `Handshake(Version) -> Version`: identity and peer-list exchange
//! - `HandleTransaction(Transaction) -> Ack`: mempool insert plus gossip
//! - `HandleBlock(Block) -> Ack`: validate, commit plus gossip
//!
//! Nodes configured with a proposer key also run a timer loop that drains
//! the mempool into signed blocks.
//!
//! # Example
//!
//! ```rust,no_run
//! use blocker_node::{Node, NodeConfig};
//!
//! # async fn run() -> Result<(), blocker_node::NodeError> {
//! let seed = Node::new(NodeConfig::default().with_listen_addr("127.0.0.1:3000"))?;
//! seed.start().await?;
//!
//! let node = Node::new(
//!     NodeConfig::default()
//!         .with_listen_addr("127.0.0.1:4000")
//!         .with_bootstrap(vec!["127.0.0.1:3000".into()]),
//! )?;
//! node.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod node;
pub mod peers;
pub mod transport;

// Re-export commonly used types
pub use client::PeerClient;
pub use config::{NodeConfig, PROTOCOL_VERSION};
pub use error::{NodeError, Result};
pub use message::{GossipMessage, Request, Response, Version};
pub use node::{Node, NodeState};
pub use peers::{Peer, PeerTable};
