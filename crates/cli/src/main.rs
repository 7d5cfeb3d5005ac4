//! blocker CLI entry point.

use anyhow::Result;
use clap::Parser;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "blocker")]
#[command(about = "A minimal UTXO ledger node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    commands::run(cli.command).await
}
