//! HackDuel server
//!
//! Starts the judging HTTP API backed by the rating engine.

use clap::Parser;
use hackduel_router::{config::AppConfig, start_server, RouterError};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// HackDuel - pairwise judging with TrueSkill-style ratings
#[derive(Debug, Parser)]
#[command(name = "hackduel")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "HACKDUEL_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // RUST_LOG wins; info otherwise
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RouterError> {
    let config = match cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => {
            tracing::warn!("No config file specified, using defaults");
            AppConfig::default()
        }
    };

    let config = config.with_env_overrides();
    config.validate()?;

    start_server(config).await
}
