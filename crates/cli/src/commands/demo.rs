//! Local three-node demo.
//!
//! Starts a proposer and two followers chained by bootstrap addresses, then
//! keeps moving one unit at a time out of the genesis output, submitting
//! each transfer over TCP to the last follower.

use crate::logging::{init_logging, LogFormat};
use anyhow::{Context, Result};
use blocker_chain::{genesis_block, genesis_keypair, GENESIS_SUPPLY};
use blocker_core::{Keypair, Transaction, TxInput, TxOutput};
use blocker_node::{Node, NodeConfig, PeerClient};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Args)]
pub struct DemoArgs {
    /// Port of the proposer; followers use the next two
    #[arg(long, default_value_t = 3000)]
    base_port: u16,

    /// Block production interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    block_time_ms: u64,

    /// Delay between submissions in milliseconds
    #[arg(long, default_value_t = 800)]
    interval_ms: u64,

    /// Stop after this many transfers (0 runs until ctrl-c)
    #[arg(long, default_value_t = 0)]
    count: u64,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

async fn start_node(config: NodeConfig) -> Result<Arc<Node>> {
    let node = Node::new(config)?;
    node.start().await.context("failed to start node")?;
    Ok(node)
}

pub async fn run(args: DemoArgs) -> Result<()> {
    init_logging(args.log_format);

    let addr = |offset: u16| format!("127.0.0.1:{}", args.base_port + offset);
    let block_time = Duration::from_millis(args.block_time_ms);

    let proposer = start_node(
        NodeConfig::default()
            .with_listen_addr(addr(0))
            .with_proposer(Keypair::generate())
            .with_block_time(block_time),
    )
    .await?;
    let middle = start_node(
        NodeConfig::default()
            .with_listen_addr(addr(1))
            .with_bootstrap(vec![proposer.listen_addr()]),
    )
    .await?;
    let entry = start_node(
        NodeConfig::default()
            .with_listen_addr(addr(2))
            .with_bootstrap(vec![middle.listen_addr()]),
    )
    .await?;
    let nodes = [proposer, middle, entry];

    let client = PeerClient::connect(
        &nodes[2].listen_addr(),
        Duration::from_secs(3),
        Duration::from_secs(5),
    )
    .await
    .context("failed to connect to entry node")?;

    let owner = genesis_keypair();
    let mut prev = genesis_block().transactions[0].hash();
    let mut prev_index = 0;
    let mut balance = GENESIS_SUPPLY;
    let mut sent = 0;

    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms));
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        if balance <= 1 || (args.count > 0 && sent >= args.count) {
            break;
        }
        // the change output only exists once its transaction is committed
        if nodes[2].chain().get_transaction(&prev).is_err() {
            debug!(prev = %prev, "waiting for previous transfer");
            continue;
        }

        let tx = Transaction::new(
            vec![TxInput::new(prev, prev_index, owner.public_key)],
            vec![
                TxOutput::new(1, Keypair::generate().address()),
                TxOutput::new(balance - 1, owner.address()),
            ],
        )
        .signed(&owner);
        prev = tx.hash();
        prev_index = 1;
        balance -= 1;

        client
            .handle_transaction(tx)
            .await
            .context("failed to submit transfer")?;
        sent += 1;
        info!(hash = %prev, sent, height = nodes[2].chain().height(), "transfer submitted");
    }

    for node in &nodes {
        node.stop();
    }
    info!(
        sent,
        heights = ?nodes.iter().map(|n| n.chain().height()).collect::<Vec<_>>(),
        "demo finished"
    );
    Ok(())
}
