mod api;
mod config;
mod extract;
mod format;
mod message;
mod poller;
mod sink;
mod transmit;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::ChatApiClient;
use crate::config::Config;
use crate::poller::Poller;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fmrelay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Starting message poller...");
    info!("  Endpoint: {}", config.api.url);
    info!("  Group ID: {}", config.api.group_id);
    info!("  Poll interval: {} seconds", config.poller.interval_secs);
    info!("  Log file: {}", config.log.path.display());
    info!(
        "  Transmitter: {} ({} MHz)",
        config.transmitter.mode, config.transmitter.frequency_mhz
    );

    let source = ChatApiClient::new(config.api.clone())?;
    let transmitter = transmit::from_config(&config.transmitter)?;

    let mut poller = Poller::new(&config, Box::new(source), transmitter);
    poller.run().await;

    Ok(())
}
