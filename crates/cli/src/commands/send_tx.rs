//! Transaction submission command.

use anyhow::{Context, Result};
use blocker_chain::{genesis_block, GENESIS_SEED};
use blocker_core::{Address, Hash, Keypair, Transaction, TxInput, TxOutput};
use blocker_node::PeerClient;
use clap::Args;
use colored::Colorize;
use std::time::Duration;

#[derive(Args)]
pub struct SendTxArgs {
    /// Node to submit to
    #[arg(long, default_value = "127.0.0.1:3000")]
    to: String,

    /// Hex seed of the key owning the spent output (default: genesis key)
    #[arg(long)]
    seed: Option<String>,

    /// Hash of the transaction holding the spent output (default: genesis mint)
    #[arg(long)]
    prev: Option<String>,

    /// Index of the spent output
    #[arg(long, default_value_t = 0)]
    index: u32,

    /// Amount to send
    #[arg(long)]
    amount: u64,

    /// Recipient address (hex)
    #[arg(long)]
    recipient: String,
}

pub async fn run(args: SendTxArgs) -> Result<()> {
    let owner = match args.seed {
        Some(seed) => Keypair::from_seed_hex(&seed).context("invalid seed")?,
        None => Keypair::from_seed_bytes(&GENESIS_SEED),
    };
    let prev = match args.prev {
        Some(prev) => Hash::from_hex(&prev).context("invalid previous transaction hash")?,
        None => genesis_block().transactions[0].hash(),
    };
    let recipient = Address::from_hex(&args.recipient).context("invalid recipient address")?;

    let tx = Transaction::new(
        vec![TxInput::new(prev, args.index, owner.public_key)],
        vec![TxOutput::new(args.amount, recipient)],
    )
    .signed(&owner);
    let hash = tx.hash();

    let client = PeerClient::connect(&args.to, Duration::from_secs(3), Duration::from_secs(5))
        .await
        .with_context(|| format!("failed to connect to {}", args.to))?;
    client
        .handle_transaction(tx)
        .await
        .context("node rejected the transaction")?;

    println!("{}", "Transaction submitted".bold().green());
    println!("  Hash:      {}", hash.to_hex().bright_yellow());
    println!("  Node:      {}", args.to);
    println!("  Amount:    {}", args.amount);
    println!("  Recipient: {}", recipient.to_hex());
    Ok(())
}
