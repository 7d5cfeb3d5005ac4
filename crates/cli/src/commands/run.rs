//! Node command.

use crate::logging::{init_logging, LogFormat};
use anyhow::{Context, Result};
use blocker_core::Keypair;
use blocker_node::{Node, NodeConfig};
use clap::Args;
use std::time::Duration;

#[derive(Args)]
pub struct RunArgs {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    listen: String,

    /// Peer to dial at startup (repeatable)
    #[arg(short, long)]
    bootstrap: Vec<String>,

    /// Hex seed of the block-signing key; makes this node the proposer
    #[arg(long)]
    proposer_seed: Option<String>,

    /// Block production interval in milliseconds
    #[arg(long, default_value_t = 5000)]
    block_time_ms: u64,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

pub async fn run(args: RunArgs) -> Result<()> {
    init_logging(args.log_format);

    let mut config = NodeConfig::default()
        .with_listen_addr(args.listen)
        .with_bootstrap(args.bootstrap)
        .with_block_time(Duration::from_millis(args.block_time_ms));
    if let Some(seed) = args.proposer_seed {
        let keypair = Keypair::from_seed_hex(&seed).context("invalid proposer seed")?;
        config = config.with_proposer(keypair);
    }

    let node = Node::new(config).context("failed to create node")?;
    let addr = node.start().await.context("failed to start node")?;
    tracing::info!(addr = %addr, "press ctrl-c to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    node.stop();
    Ok(())
}
