//! Runtime configuration from environment and CLI.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "grovekeeper")]
#[command(about = "Telegram bot coordinating community tree maintenance")]
#[command(version)]
pub struct Cli {
    /// Directory holding the ledger files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub moderator_id: i64,
    pub data_dir: PathBuf,
}

impl Config {
    /// Reads `BOT_TOKEN` and `MODERATOR_ID` from the environment (a `.env`
    /// file is honored by `main`) and merges the CLI arguments.
    pub fn from_env(cli: Cli) -> Result<Self> {
        let bot_token = std::env::var("BOT_TOKEN").context("BOT_TOKEN is not set")?;
        let moderator_id = std::env::var("MODERATOR_ID")
            .context("MODERATOR_ID is not set")?
            .parse::<i64>()
            .context("MODERATOR_ID is not a numeric chat id")?;
        Ok(Self {
            bot_token,
            moderator_id,
            data_dir: cli.data_dir,
        })
    }
}
