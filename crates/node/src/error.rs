//! Node error type.

use blocker_chain::ChainError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("frame of {0} bytes exceeds the size limit")]
    FrameTooLarge(usize),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("unexpected response to {0}")]
    UnexpectedResponse(&'static str),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("node is not configured as a proposer")]
    NotProposer,

    #[error("node was already started")]
    AlreadyStarted,
}

impl NodeError {
    /// The connection itself is unusable, as opposed to the peer answering
    /// with an error.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Codec(_)
                | Self::FrameTooLarge(_)
                | Self::ConnectionClosed
                | Self::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;
