//! Vectorcase CLI entry point.

use anyhow::Context;
use clap::Parser;

use vectorcase::cli::{commands, handle_error, Cli};
use vectorcase::infrastructure::config::ConfigLoader;
use vectorcase::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
    .context("Failed to load configuration")?;

    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;
    tracing::debug!(command = ?std::env::args().nth(1), "starting");

    commands::execute(cli.command, config, cli.json).await
}
