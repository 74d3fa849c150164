mod address;
mod config;
mod error;
mod forwarder;
mod inbound;
mod media;
mod outbound;
mod platform;
mod relay;
mod roster;
mod scheduler;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::gateway::GatewayTransport;
use crate::platform::SessionTransport;
use crate::relay::Relay;
use crate::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,zap_relay=debug".into()),
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

    info!("Configuration loaded successfully");
    info!("  Backend: {}", config.backend.base_url);
    info!("  Session gateway: {}", config.session.gateway_url);
    info!("  Roster settle delay: {}s", config.sync.settle_delay_secs);
    if let Some(cron) = &config.sync.resync_cron {
        info!("  Roster resync: {}", cron);
    }

    // One session for the whole process
    let transport: Arc<dyn SessionTransport> =
        Arc::new(GatewayTransport::new(config.session.clone()));

    let scheduler = Scheduler::new().await?;
    scheduler.start().await?;

    let relay = Arc::new(Relay::new(&config, transport, Some(scheduler)));
    relay.register_jobs().await?;

    info!("Relay is starting, waiting for the session to report ready...");
    server::serve(relay.clone(), &config.server).await?;

    if let Some(relay) = Arc::into_inner(relay) {
        relay.shutdown().await;
    }

    Ok(())
}
