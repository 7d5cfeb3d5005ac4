//! Multi-node scenarios over real TCP on localhost.

use blocker_chain::genesis_keypair;
use blocker_core::{Address, Keypair, Transaction, TxInput, TxOutput};
use blocker_node::{Node, NodeConfig, NodeState, PeerClient, Version, PROTOCOL_VERSION};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        sleep(Duration::from_millis(20)).await;
    }
}

fn config() -> NodeConfig {
    NodeConfig::default().with_listen_addr("127.0.0.1:0")
}

async fn start(config: NodeConfig) -> Arc<Node> {
    let node = Node::new(config).unwrap();
    node.start().await.unwrap();
    node
}

fn spend_genesis(node: &Node, amount: u64, to: Address) -> Transaction {
    let owner = genesis_keypair();
    let genesis_tx = node.chain().get_block_by_height(0).unwrap().transactions[0].hash();
    Transaction::new(
        vec![TxInput::new(genesis_tx, 0, owner.public_key)],
        vec![TxOutput::new(amount, to)],
    )
    .signed(&owner)
}

/// A, then B bootstrapping from A, then C bootstrapping from B.
async fn three_nodes() -> (Arc<Node>, Arc<Node>, Arc<Node>) {
    let a = start(config()).await;
    let b = start(config().with_bootstrap(vec![a.listen_addr()])).await;
    let c = start(config().with_bootstrap(vec![b.listen_addr()])).await;

    // C learns about A through B's announcement
    wait_until("full mesh", || {
        a.peers().len() == 2 && b.peers().len() == 2 && c.peers().len() == 2
    })
    .await;

    (a, b, c)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handshake_registers_both_sides() {
    let a = start(config()).await;
    let b = start(config().with_bootstrap(vec![a.listen_addr()])).await;

    wait_until("handshake", || a.peers().len() == 1 && b.peers().len() == 1).await;

    assert!(a.peers().contains(&b.listen_addr()));
    assert!(b.peers().contains(&a.listen_addr()));
    let announced = b.peers().get(&a.listen_addr()).unwrap().version;
    assert_eq!(announced.version, "blocker-0.1");
    assert_eq!(announced.height, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_transaction_reaches_every_node_once() {
    let (a, b, c) = three_nodes().await;
    let tx = spend_genesis(&a, 250, Keypair::generate().address());
    let hash = tx.hash();

    assert!(a.handle_transaction(tx));

    wait_until("gossip", || {
        b.mempool().contains(&hash) && c.mempool().contains(&hash)
    })
    .await;
    // let any echoes settle
    sleep(Duration::from_millis(200)).await;

    for node in [&a, &b, &c] {
        assert_eq!(node.mempool().len(), 1);
        assert!(node.mempool().contains(&hash));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remote_submission_is_gossiped() {
    let (a, b, c) = three_nodes().await;
    let tx = spend_genesis(&a, 10, Keypair::generate().address());
    let hash = tx.hash();

    let client = PeerClient::connect(
        &c.listen_addr(),
        Duration::from_secs(1),
        Duration::from_secs(1),
    )
    .await
    .unwrap();
    client.handle_transaction(tx.clone()).await.unwrap();
    // a resubmission is still acknowledged
    client.handle_transaction(tx).await.unwrap();

    wait_until("gossip", || {
        a.mempool().contains(&hash) && b.mempool().contains(&hash)
    })
    .await;
    assert_eq!(c.mempool().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_self_bootstrap_never_registers_self() {
    let a = start(config()).await;
    let own = a.listen_addr();

    a.bootstrap(vec![own.clone(), own.clone()]).await;
    sleep(Duration::from_millis(100)).await;

    assert!(a.peers().is_empty());
    assert!(!a.peers().contains(&own));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_hostname_self_bootstrap_never_registers_self() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let own = format!("localhost:{port}");
    let a = start(
        NodeConfig::default()
            .with_listen_addr(own.clone())
            .with_bootstrap(vec![own.clone()]),
    )
    .await;
    assert_ne!(a.listen_addr(), own);

    sleep(Duration::from_millis(500)).await;
    assert!(a.peers().is_empty());

    // the dial and handshake complete before bootstrap returns
    a.bootstrap(vec![own]).await;
    assert!(a.peers().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_peers_keyed_by_announced_address() {
    let a = start(config()).await;
    let port = a.listen_addr().rsplit(':').next().unwrap().to_string();
    let b = start(config().with_bootstrap(vec![format!("localhost:{port}")])).await;

    wait_until("handshake", || a.peers().len() == 1 && b.peers().len() == 1).await;
    assert!(b.peers().contains(&a.listen_addr()));
    assert!(!b.peers().contains(&format!("localhost:{port}")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeated_handshake_refreshes_and_discovers() {
    let a = start(config()).await;
    let b = start(config().with_bootstrap(vec![a.listen_addr()])).await;
    let c = start(config()).await;
    wait_until("handshake", || a.peers().len() == 1 && b.peers().len() == 1).await;

    let announced = Version {
        version: PROTOCOL_VERSION.to_string(),
        height: 7,
        listen_addr: b.listen_addr(),
        peers: vec![c.listen_addr()],
    };
    a.handshake(announced.clone()).await.unwrap();

    assert_eq!(a.peers().len(), 1);
    assert_eq!(a.peers().get(&b.listen_addr()).unwrap().version, announced);
    wait_until("discovery", || {
        a.peers().contains(&c.listen_addr()) && c.peers().contains(&a.listen_addr())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicate_bootstrap_connects_once() {
    let a = start(config()).await;
    let b = start(config().with_bootstrap(vec![a.listen_addr(), a.listen_addr()])).await;

    wait_until("handshake", || b.peers().len() == 1).await;
    b.bootstrap(vec![a.listen_addr()]).await;
    sleep(Duration::from_millis(100)).await;

    assert_eq!(a.peers().len(), 1);
    assert_eq!(b.peers().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_proposer_block_propagates() {
    let proposer = start(
        config()
            .with_proposer(Keypair::generate())
            .with_block_time(Duration::from_millis(100)),
    )
    .await;
    let follower = start(config().with_bootstrap(vec![proposer.listen_addr()])).await;
    wait_until("handshake", || follower.peers().len() == 1 && proposer.peers().len() == 1)
        .await;

    let recipient = Keypair::generate().address();
    let tx = spend_genesis(&follower, 400, recipient);
    let hash = tx.hash();
    follower.handle_transaction(tx);

    wait_until("block on both nodes", || {
        proposer.chain().height() == 1 && follower.chain().height() == 1
    })
    .await;

    assert_eq!(proposer.chain().top_hash(), follower.chain().top_hash());
    let block = follower.chain().get_block_by_height(1).unwrap();
    assert_eq!(block.transactions[0].hash(), hash);
    assert_eq!(follower.chain().get_transaction(&hash).unwrap().outputs[0].address, recipient);

    wait_until("mempools drained", || {
        proposer.mempool().is_empty() && follower.mempool().is_empty()
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dead_peer_is_removed_on_broadcast() {
    let a = start(config()).await;
    let b = start(config().with_bootstrap(vec![a.listen_addr()])).await;
    wait_until("handshake", || a.peers().len() == 1 && b.peers().len() == 1).await;

    b.stop();
    assert_eq!(b.state(), NodeState::Stopped);
    // give the stopped node time to close its connections
    sleep(Duration::from_millis(100)).await;

    a.handle_transaction(spend_genesis(&a, 1, Address::default()));
    wait_until("peer removal", || a.peers().is_empty()).await;
}
