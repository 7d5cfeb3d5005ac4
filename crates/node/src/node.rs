//! The network-facing node.
//!
//! A node moves from [`NodeState::Idle`] to [`NodeState::Listening`] when
//! [`Node::start`] binds its listener. From then on it serves remote calls,
//! dials its bootstrap peers, and (with a proposer key) produces a block
//! every `block_time`. [`Node::stop`] ends the accept and proposer loops.
//!
//! Gossip is a plain flood: a transaction or block that is new to this node
//! is sent to every known peer, and a peer that already has it stops the
//! flood there. Fan-out runs on its own task, outside every lock.

use crate::client::PeerClient;
use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::message::{GossipMessage, Request, Response, Version};
use crate::peers::{Peer, PeerTable};
use crate::transport::{read_frame, write_frame};
use blocker_chain::{Chain, Mempool};
use blocker_consensus::BlockProposer;
use blocker_core::{Block, Transaction, UtxoKey};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    Listening,
    Stopped,
}

pub struct Node {
    config: NodeConfig,
    chain: Chain,
    mempool: Mempool,
    peers: PeerTable,
    proposer: Option<BlockProposer>,
    listen_addr: RwLock<String>,
    state: RwLock<NodeState>,
    shutdown: watch::Sender<bool>,
}

impl Node {
    /// A node over a fresh in-memory chain.
    pub fn new(config: NodeConfig) -> Result<Arc<Self>> {
        Ok(Self::with_chain(config, Chain::new()?))
    }

    pub fn with_chain(config: NodeConfig, chain: Chain) -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            proposer: config.proposer.clone().map(BlockProposer::new),
            listen_addr: RwLock::new(config.listen_addr.clone()),
            config,
            chain,
            mempool: Mempool::new(),
            peers: PeerTable::new(),
            state: RwLock::new(NodeState::Idle),
            shutdown,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    pub fn state(&self) -> NodeState {
        *self.state.read()
    }

    pub fn is_proposer(&self) -> bool {
        self.proposer.is_some()
    }

    /// The bound address once started, the configured one before.
    pub fn listen_addr(&self) -> String {
        self.listen_addr.read().clone()
    }

    /// This node's identity announcement.
    pub fn version(&self) -> Version {
        Version {
            version: self.config.version.clone(),
            height: self.chain.height(),
            listen_addr: self.listen_addr(),
            peers: self.peers.addrs(),
        }
    }

    /// Bind the listener and spawn the accept, bootstrap and proposer tasks.
    /// Returns the bound address.
    pub async fn start(self: &Arc<Self>) -> Result<SocketAddr> {
        if self.state() != NodeState::Idle {
            return Err(NodeError::AlreadyStarted);
        }

        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        let local = listener.local_addr()?;
        *self.listen_addr.write() = local.to_string();
        *self.state.write() = NodeState::Listening;
        info!(addr = %local, proposer = self.is_proposer(), "node listening");

        tokio::spawn(Arc::clone(self).accept_loop(listener, self.shutdown.subscribe()));

        if !self.config.bootstrap.is_empty() {
            let node = Arc::clone(self);
            let addrs = self.config.bootstrap.clone();
            tokio::spawn(async move { node.bootstrap(addrs).await });
        }

        if self.is_proposer() {
            tokio::spawn(Arc::clone(self).proposer_loop(self.shutdown.subscribe()));
        }

        Ok(local)
    }

    pub fn stop(&self) {
        *self.state.write() = NodeState::Stopped;
        self.shutdown.send_replace(true);
        info!(addr = %self.listen_addr(), "node stopped");
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        debug!(remote = %remote, "connection accepted");
                        let node = Arc::clone(&self);
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = node.serve_connection(stream, shutdown).await {
                                debug!(remote = %remote, error = %e, "connection closed");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                _ = shutdown.changed() => break,
            }
        }
        debug!("accept loop exited");
    }

    async fn serve_connection(
        self: Arc<Self>,
        mut stream: TcpStream,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            let request = tokio::select! {
                frame = read_frame::<_, Request>(&mut stream) => frame?,
                _ = shutdown.changed() => return Ok(()),
            };
            let Some(request) = request else {
                return Ok(());
            };
            let response = self.dispatch(request).await;
            write_frame(&mut stream, &response).await?;
        }
    }

    async fn dispatch(self: &Arc<Self>, request: Request) -> Response {
        match request {
            Request::Handshake(remote) => match self.handshake(remote).await {
                Ok(local) => Response::Version(local),
                Err(e) => Response::Error(e.to_string()),
            },
            Request::HandleTransaction(tx) => {
                self.handle_transaction(tx);
                Response::Ack
            }
            Request::HandleBlock(block) => match self.handle_block(block) {
                Ok(_) => Response::Ack,
                Err(e) => Response::Error(e.to_string()),
            },
        }
    }

    /// Answer a handshake and return this node's announcement. An unknown
    /// caller is dialed back on its listen address and registered; a known
    /// one has its stored announcement refreshed.
    pub async fn handshake(self: &Arc<Self>, remote: Version) -> Result<Version> {
        let addr = remote.listen_addr.clone();
        debug!(peer = %addr, height = remote.height, "handshake received");
        if addr == self.listen_addr() {
            return Ok(self.version());
        }

        if self.peers.refresh(remote.clone()) {
            debug!(peer = %addr, height = remote.height, "peer announcement refreshed");
            self.discover(remote.peers);
        } else {
            let client =
                PeerClient::connect(&addr, self.config.dial_timeout, self.config.rpc_timeout)
                    .await?;
            self.add_peer(client, remote);
        }
        Ok(self.version())
    }

    /// Insert into the mempool; if new, gossip it. Returns whether it was new.
    pub fn handle_transaction(self: &Arc<Self>, tx: Transaction) -> bool {
        let hash = tx.hash();
        if !self.mempool.add(tx.clone()) {
            debug!(hash = %hash, "transaction already known");
            return false;
        }
        info!(hash = %hash, pool = self.mempool.len(), "transaction added to mempool");
        self.spawn_broadcast(GossipMessage::Transaction(tx));
        true
    }

    /// Commit a block received from a peer and gossip it. A block already in
    /// the chain is acknowledged without further gossip. Returns whether the
    /// block was new.
    pub fn handle_block(self: &Arc<Self>, block: Block) -> Result<bool> {
        let hash = block.hash();
        if self.chain.has_block(&hash)? {
            debug!(hash = %hash, "block already known");
            return Ok(false);
        }

        if let Err(e) = self.chain.add_block(block.clone()) {
            // lost a race against another delivery of the same block
            if self.chain.has_block(&hash)? {
                return Ok(false);
            }
            warn!(hash = %hash, error = %e, "block rejected");
            return Err(e.into());
        }

        for tx in &block.transactions {
            self.mempool.remove(&tx.hash());
        }
        self.prune_mempool();
        self.spawn_broadcast(GossipMessage::Block(block));
        Ok(true)
    }

    /// Dial and handshake every address that is neither this node nor an
    /// existing peer.
    pub async fn bootstrap(self: &Arc<Self>, addrs: Vec<String>) {
        for addr in addrs {
            if !self.can_connect_with(&addr) {
                debug!(peer = %addr, "skipping bootstrap address");
                continue;
            }
            if let Err(e) = self.dial(&addr).await {
                warn!(peer = %addr, error = %e, "bootstrap failed");
            }
        }
    }

    async fn dial(self: &Arc<Self>, addr: &str) -> Result<()> {
        let client =
            PeerClient::connect(addr, self.config.dial_timeout, self.config.rpc_timeout).await?;
        let remote = client.handshake(self.version()).await?;
        if remote.listen_addr == self.listen_addr() {
            debug!(peer = %client.addr(), "dialed own listener, dropping connection");
            return Ok(());
        }
        self.add_peer(client, remote);
        Ok(())
    }

    fn can_connect_with(&self, addr: &str) -> bool {
        addr != self.listen_addr() && !self.peers.contains(addr)
    }

    // Register the peer under its announced address, then dial whatever it
    // knows that we don't.
    fn add_peer(self: &Arc<Self>, client: PeerClient, version: Version) {
        let addr = version.listen_addr.clone();
        let candidates = version.peers.clone();
        let height = version.height;
        if !self.peers.add(Peer::new(client, version)) {
            debug!(peer = %addr, "already connected");
            return;
        }
        info!(peer = %addr, height, peers = self.peers.len(), "peer connected");
        self.discover(candidates);
    }

    fn discover(self: &Arc<Self>, candidates: Vec<String>) {
        let unknown: Vec<String> = candidates
            .into_iter()
            .filter(|a| self.can_connect_with(a))
            .collect();
        if !unknown.is_empty() {
            let node = Arc::clone(self);
            tokio::spawn(async move { node.bootstrap(unknown).await });
        }
    }

    fn spawn_broadcast(self: &Arc<Self>, msg: GossipMessage) {
        let node = Arc::clone(self);
        tokio::spawn(async move { node.broadcast(msg).await });
    }

    /// Send `msg` to every peer concurrently. Peers whose connection fails
    /// are dropped from the table; error replies are only logged.
    pub async fn broadcast(&self, msg: GossipMessage) {
        let kind = msg.kind();
        let sends = self.peers.snapshot().into_iter().map(|peer| {
            let msg = msg.clone();
            async move {
                let result = peer.client.send(msg).await;
                (peer, result)
            }
        });

        for (peer, result) in join_all(sends).await {
            match result {
                Ok(()) => debug!(peer = %peer.addr(), kind, "gossip delivered"),
                Err(e) if e.is_network() => {
                    warn!(peer = %peer.addr(), kind, error = %e, "peer unreachable, removing");
                    self.peers.remove(peer.addr());
                }
                Err(e) => warn!(peer = %peer.addr(), kind, error = %e, "gossip refused"),
            }
        }
    }

    async fn proposer_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.block_time);
        // the first tick fires immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.propose_block() {
                        warn!(error = %e, "block production failed");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("proposer loop exited");
    }

    /// Drain the mempool into a signed block, commit it and gossip it.
    /// Returns `None` when nothing in the pool could be included.
    pub fn propose_block(self: &Arc<Self>) -> Result<Option<Block>> {
        let proposer = self.proposer.as_ref().ok_or(NodeError::NotProposer)?;

        let batch = self.select_transactions(self.mempool.clear());
        if batch.is_empty() {
            debug!("nothing to propose");
            return Ok(None);
        }

        let block = proposer.propose(self.chain.top_hash(), batch);
        self.commit_proposal(&block)?;
        info!(
            height = self.chain.height(),
            hash = %block.hash(),
            txs = block.transactions.len(),
            "block produced"
        );

        self.prune_mempool();
        self.spawn_broadcast(GossipMessage::Block(block.clone()));
        Ok(Some(block))
    }

    // The batch was taken out of the pool before commit; a refused block
    // puts it back so still-valid transactions get another chance.
    fn commit_proposal(&self, block: &Block) -> Result<()> {
        if let Err(e) = self.chain.add_block(block.clone()) {
            for tx in &block.transactions {
                self.mempool.add(tx.clone());
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Drop pooled transactions that no longer validate against the top of
    /// the chain, committed ones included.
    fn prune_mempool(&self) {
        for tx in self.mempool.transactions() {
            if let Err(e) = self.chain.validate_transaction(&tx) {
                let hash = tx.hash();
                debug!(hash = %hash, error = %e, "pruning transaction from mempool");
                self.mempool.remove(&hash);
            }
        }
    }

    // Keep transactions that validate on their own and don't claim an output
    // an earlier one in the batch already spends.
    fn select_transactions(&self, pending: Vec<Transaction>) -> Vec<Transaction> {
        let mut claimed = HashSet::new();
        pending
            .into_iter()
            .filter(|tx| {
                if let Err(e) = self.chain.validate_transaction(tx) {
                    debug!(hash = %tx.hash(), error = %e, "dropping invalid transaction");
                    return false;
                }
                let keys: Vec<UtxoKey> = tx.inputs.iter().map(UtxoKey::spent_by).collect();
                if keys.iter().any(|k| claimed.contains(k)) {
                    debug!(hash = %tx.hash(), "dropping conflicting transaction");
                    return false;
                }
                claimed.extend(keys);
                true
            })
            .collect()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("listen_addr", &self.listen_addr())
            .field("state", &self.state())
            .field("height", &self.chain.height())
            .field("peers", &self.peers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocker_chain::genesis_keypair;
    use blocker_core::{Address, Keypair, TxInput, TxOutput};

    fn idle_node() -> Arc<Node> {
        Node::new(NodeConfig::default().with_listen_addr("127.0.0.1:0")).unwrap()
    }

    fn spend_genesis(node: &Node, amount: u64) -> Transaction {
        let owner = genesis_keypair();
        let genesis_tx = node.chain().get_block_by_height(0).unwrap().transactions[0].hash();
        Transaction::new(
            vec![TxInput::new(genesis_tx, 0, owner.public_key)],
            vec![TxOutput::new(amount, Address::default())],
        )
        .signed(&owner)
    }

    #[tokio::test]
    async fn test_new_node_is_idle() {
        let node = idle_node();
        assert_eq!(node.state(), NodeState::Idle);
        assert!(!node.is_proposer());
        assert_eq!(node.version().height, 0);
        assert_eq!(node.version().version, "blocker-0.1");
    }

    #[tokio::test]
    async fn test_handle_transaction_dedups() {
        let node = idle_node();
        let tx = spend_genesis(&node, 10);

        assert!(node.handle_transaction(tx.clone()));
        assert!(!node.handle_transaction(tx));
        assert_eq!(node.mempool().len(), 1);
    }

    #[tokio::test]
    async fn test_propose_requires_key() {
        let node = idle_node();
        assert!(matches!(node.propose_block(), Err(NodeError::NotProposer)));
    }

    #[tokio::test]
    async fn test_propose_skips_empty_pool() {
        let node = Node::new(
            NodeConfig::default()
                .with_listen_addr("127.0.0.1:0")
                .with_proposer(Keypair::generate()),
        )
        .unwrap();

        assert!(node.propose_block().unwrap().is_none());
        assert_eq!(node.chain().height(), 0);
    }

    #[tokio::test]
    async fn test_propose_filters_conflicts_and_invalid() {
        let node = Node::new(
            NodeConfig::default()
                .with_listen_addr("127.0.0.1:0")
                .with_proposer(Keypair::generate()),
        )
        .unwrap();

        node.handle_transaction(spend_genesis(&node, 100));
        node.handle_transaction(spend_genesis(&node, 200));
        node.handle_transaction(spend_genesis(&node, 5000));

        let block = node.propose_block().unwrap().unwrap();
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(node.chain().height(), 1);
        assert!(node.mempool().is_empty());
    }

    #[tokio::test]
    async fn test_handle_block_commits_once() {
        let node = idle_node();
        let tx = spend_genesis(&node, 10);
        node.handle_transaction(tx.clone());

        let block = BlockProposer::new(Keypair::generate()).propose(node.chain().top_hash(), vec![tx]);

        assert!(node.handle_block(block.clone()).unwrap());
        assert!(!node.handle_block(block).unwrap());
        assert_eq!(node.chain().height(), 1);
        assert!(node.mempool().is_empty());
    }

    #[tokio::test]
    async fn test_refused_proposal_returns_batch() {
        let node = Node::new(
            NodeConfig::default()
                .with_listen_addr("127.0.0.1:0")
                .with_proposer(Keypair::generate()),
        )
        .unwrap();
        let tx = spend_genesis(&node, 10);
        let hash = tx.hash();
        node.handle_transaction(tx.clone());
        let drained = node.mempool().clear();
        assert_eq!(drained.len(), 1);

        // a competing commit moved the top after selection
        let stale = BlockProposer::new(Keypair::generate()).propose(Default::default(), drained);
        assert!(matches!(
            node.commit_proposal(&stale),
            Err(NodeError::Chain(_))
        ));
        assert_eq!(node.chain().height(), 0);
        assert_eq!(node.mempool().get(&hash), Some(tx));

        let block = node.propose_block().unwrap().unwrap();
        assert_eq!(block.transactions[0].hash(), hash);
        assert!(node.mempool().is_empty());
    }

    #[tokio::test]
    async fn test_block_prunes_stale_mempool_entries() {
        let node = idle_node();
        let included = spend_genesis(&node, 10);
        let conflicting = spend_genesis(&node, 20);
        let orphan = {
            let kp = Keypair::generate();
            Transaction::new(
                vec![TxInput::new(Default::default(), 0, kp.public_key)],
                vec![TxOutput::new(1, Address::default())],
            )
            .signed(&kp)
        };
        node.handle_transaction(conflicting);
        node.handle_transaction(orphan);
        assert_eq!(node.mempool().len(), 2);

        let block =
            BlockProposer::new(Keypair::generate()).propose(node.chain().top_hash(), vec![included]);
        assert!(node.handle_block(block).unwrap());
        assert!(node.mempool().is_empty());
    }

    #[tokio::test]
    async fn test_handle_block_rejects_bad_parent() {
        let node = idle_node();
        let block = BlockProposer::new(Keypair::generate()).propose(Default::default(), vec![]);
        assert!(matches!(
            node.handle_block(block),
            Err(NodeError::Chain(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_stop() {
        let node = idle_node();
        let addr = node.start().await.unwrap();

        assert_ne!(addr.port(), 0);
        assert_eq!(node.listen_addr(), addr.to_string());
        assert_eq!(node.state(), NodeState::Listening);
        assert!(matches!(node.start().await, Err(NodeError::AlreadyStarted)));

        node.stop();
        assert_eq!(node.state(), NodeState::Stopped);
    }
}
