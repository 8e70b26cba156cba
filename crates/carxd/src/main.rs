//! Car Expert Daemon - HTTP chat adapter
//!
//! Serves the bilingual car maintenance assistant over JSON.

use anyhow::{Context, Result};
use carx_common::CarxConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "carxd")]
#[command(about = "Car Expert daemon", version)]
struct Cli {
    /// Config file (default: $CARX_CONFIG or /etc/carx/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen address from the config
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.config.unwrap_or_else(CarxConfig::default_path);
    let mut config = CarxConfig::load_from(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    // RUST_LOG wins over the config level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Car Expert Daemon v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Config: {}", path.display());

    carxd::server::run(&config).await
}
