//! Connected peers.

use crate::client::PeerClient;
use crate::message::Version;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A live connection plus the identity the peer announced.
#[derive(Debug, Clone)]
pub struct Peer {
    pub client: Arc<PeerClient>,
    pub version: Version,
}

impl Peer {
    pub fn new(client: PeerClient, version: Version) -> Self {
        Self {
            client: Arc::new(client),
            version,
        }
    }

    /// The listen address the peer announced, which may differ from the
    /// string that was dialed.
    pub fn addr(&self) -> &str {
        &self.version.listen_addr
    }
}

/// Peers keyed by listen address.
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: RwLock<HashMap<String, Peer>>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `peer` unless its address is already present. Returns
    /// whether it was added.
    pub fn add(&self, peer: Peer) -> bool {
        let mut peers = self.peers.write();
        if peers.contains_key(peer.addr()) {
            return false;
        }
        peers.insert(peer.addr().to_string(), peer);
        true
    }

    /// Replace the stored announcement of a known peer. Returns false if
    /// no peer is registered under `version.listen_addr`.
    pub fn refresh(&self, version: Version) -> bool {
        match self.peers.write().get_mut(&version.listen_addr) {
            Some(peer) => {
                peer.version = version;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, addr: &str) -> Option<Peer> {
        self.peers.write().remove(addr)
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.peers.read().contains_key(addr)
    }

    pub fn get(&self, addr: &str) -> Option<Peer> {
        self.peers.read().get(addr).cloned()
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Known listen addresses, sorted.
    pub fn addrs(&self) -> Vec<String> {
        let mut addrs: Vec<_> = self.peers.read().keys().cloned().collect();
        addrs.sort();
        addrs
    }

    /// Copy of every entry, for use outside the lock.
    pub fn snapshot(&self) -> Vec<Peer> {
        self.peers.read().values().cloned().collect()
    }
}
