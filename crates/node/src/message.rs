//! Wire messages.

use blocker_core::{Block, Transaction};
use serde::{Deserialize, Serialize};

/// Identity announcement exchanged in a handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
    pub height: u64,
    pub listen_addr: String,
    /// Listen addresses of the sender's known peers.
    pub peers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    Handshake(Version),
    HandleTransaction(Transaction),
    HandleBlock(Block),
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Handshake(_) => "handshake",
            Self::HandleTransaction(_) => "transaction",
            Self::HandleBlock(_) => "block",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Version(Version),
    Ack,
    Error(String),
}

/// Payloads flooded to every known peer.
#[derive(Debug, Clone)]
pub enum GossipMessage {
    Transaction(Transaction),
    Block(Block),
}

impl GossipMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transaction(_) => "transaction",
            Self::Block(_) => "block",
        }
    }
}

impl From<GossipMessage> for Request {
    fn from(msg: GossipMessage) -> Self {
        match msg {
            GossipMessage::Transaction(tx) => Request::HandleTransaction(tx),
            GossipMessage::Block(block) => Request::HandleBlock(block),
        }
    }
}
