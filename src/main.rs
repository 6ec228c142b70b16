//! Entry point: configuration, ledger load, and dispatcher launch.

mod config;
mod domain;
mod engine;
mod report;
mod store;
mod transport;

use anyhow::Result;
use clap::Parser;
use config::{Cli, Config};
use engine::WorkflowEngine;
use store::FileLedgerStore;
use teloxide::Bot;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env(Cli::parse())?;
    let store = FileLedgerStore::new(&config.data_dir);
    // Ledger load failure aborts startup rather than running on empty state.
    let engine = WorkflowEngine::load(store)?;
    let bot = Bot::new(config.bot_token.clone());
    transport::telegram::run(bot, engine, &config).await
}
