//! Keypair generation command.

use anyhow::{Context, Result};
use blocker_core::Keypair;
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct KeygenArgs {
    /// Derive from this 32-byte hex seed instead of generating one
    #[arg(short, long)]
    seed: Option<String>,
}

pub fn run(args: KeygenArgs) -> Result<()> {
    let keypair = match args.seed {
        Some(seed) => Keypair::from_seed_hex(&seed).context("invalid seed")?,
        None => Keypair::generate(),
    };

    let title = if keypair.seed() == blocker_chain::GENESIS_SEED {
        "Genesis keypair:"
    } else {
        "Keypair:"
    };
    println!("{}", title.bold().cyan());
    println!();
    println!("  Address:     {}", keypair.address().to_hex().bright_yellow());
    println!(
        "  Public Key:  {}",
        hex::encode(keypair.public_key.as_bytes()).bright_black()
    );
    println!("  Seed:        {}", hex::encode(keypair.seed()).bright_black());
    Ok(())
}
