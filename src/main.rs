mod aggregate;
mod auth;
mod cli;
mod config;
mod digest;
mod error;
mod output;
mod scheduler;
mod server;
mod snapshot;
mod sources;
mod webex;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting devdash - DIY DevOps Dashboard");
    cli.execute().await?;

    Ok(())
}
