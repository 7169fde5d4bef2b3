//! agentcore CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use agentcore::cli::{self, Cli};
use agentcore::infrastructure::config::ConfigLoader;
use agentcore::infrastructure::logging::{LogConfig, LoggerImpl};
use agentcore::services::AgentManager;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        cli::handle_error(&err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
    .context("Failed to load configuration")?;

    let mut log_config = LogConfig::try_from(&config.logging)?;
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logger = LoggerImpl::init(&log_config).context("Failed to initialize logging")?;

    let manager = AgentManager::from_config(config)?;
    cli::run(cli.command, &manager, cli.json).await
}
