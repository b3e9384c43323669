mod cli;
mod config;
mod service;

use anyhow::Result;
use clap::Parser;
use crate::cli::Cli;
use crate::config::Config;
use crate::service::ShelfService;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration, then let command-line flags win
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json_logs {
        config.logging.format = "json".to_string();
    }

    let service = ShelfService::new(config, cli.roots);
    service.init_logging()?;
    service.run(cli.command).await
}
