//! NASDANQ - Solana Token Leaderboard
//!
//! Ranked token tables, market stats and a live watch mode from DexScreener data.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use nasdanq::adapters::cli;
use nasdanq::config::{load_config, load_config_or_default, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (NASDANQ__* overrides can live here)
    dotenvy::dotenv().ok();

    let app = cli::init();

    let config = match &app.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => load_config_or_default(DEFAULT_CONFIG_PATH)
            .context("Failed to load configuration")?,
    };

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    cli::execute(app, config).await
}

fn init_logging(verbose: bool, debug: bool, level: &str) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
