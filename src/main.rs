use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use goliath::cli::{run_cli, Cli};
use goliath::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(&config)?;
    run_cli(cli, config).await
}

/// Logs go to a file: the terminal is owned by the game view.
fn init_tracing(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}
