//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod demo;
mod keygen;
mod run;
mod send_tx;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a node
    Run(run::RunArgs),
    /// Generate or inspect a keypair
    Keygen(keygen::KeygenArgs),
    /// Sign a transaction and submit it to a node
    SendTx(send_tx::SendTxArgs),
    /// Run three local nodes and feed them transactions
    Demo(demo::DemoArgs),
}

pub async fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Run(args) => run::run(args).await,
        Commands::Keygen(args) => keygen::run(args),
        Commands::SendTx(args) => send_tx::run(args).await,
        Commands::Demo(args) => demo::run(args).await,
    }
}
