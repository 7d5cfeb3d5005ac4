//! Node configuration.

use blocker_core::Keypair;
use std::time::Duration;

/// Version string announced in every handshake.
pub const PROTOCOL_VERSION: &str = "blocker-0.1";

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub version: String,
    /// Address to bind; port 0 picks a free port.
    pub listen_addr: String,
    /// Key that signs blocks. `None` disables block production.
    pub proposer: Option<Keypair>,
    /// Peers dialed once the listener is up.
    pub bootstrap: Vec<String>,
    /// Interval of the block production loop.
    pub block_time: Duration,
    pub dial_timeout: Duration,
    /// Upper bound on one request/response exchange.
    pub rpc_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            listen_addr: "127.0.0.1:3000".to_string(),
            proposer: None,
            bootstrap: Vec::new(),
            block_time: Duration::from_secs(5),
            dial_timeout: Duration::from_secs(3),
            rpc_timeout: Duration::from_secs(5),
        }
    }
}

impl NodeConfig {
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    pub fn with_proposer(mut self, keypair: Keypair) -> Self {
        self.proposer = Some(keypair);
        self
    }

    pub fn with_bootstrap(mut self, peers: Vec<String>) -> Self {
        self.bootstrap = peers;
        self
    }

    pub fn with_block_time(mut self, block_time: Duration) -> Self {
        self.block_time = block_time;
        self
    }

    pub fn with_timeouts(mut self, dial: Duration, rpc: Duration) -> Self {
        self.dial_timeout = dial;
        self.rpc_timeout = rpc;
        self
    }
}
