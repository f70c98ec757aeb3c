use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use esglens_broker::{declare_durable, publish_persistent, Broker};
use esglens_common::config::TelemetryConfig;
use esglens_common::{EsgError, DASHBOARD_LINKS_QUEUE};
use esglens_store::LinkStore;

/// Stateless fan-out: every tick publishes one message per dashboard URL.
/// Overruns are tolerated; consumers are idempotent at-least-once.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("esglens=info".parse()?))
        .init();

    info!("Telemetry scheduler starting");

    let config = TelemetryConfig::from_env();

    let pool = esglens_store::connect(&config.database).await?;
    esglens_store::migrate(&pool).await?;
    let links = LinkStore::new(pool);

    let mut ticker = tokio::time::interval(Duration::from_secs(config.schedule_interval_secs));

    loop {
        // The first tick fires immediately, matching a run at startup.
        ticker.tick().await;
        if let Err(e) = publish_links(&config, &links).await {
            warn!(error = %e, "Scheduler tick failed");
        }
    }
}

async fn publish_links(config: &TelemetryConfig, links: &LinkStore) -> Result<(), EsgError> {
    let rows = links.all().await?;
    info!(links = rows.len(), "Fanning out dashboard links");

    let broker = Broker::connect(&config.broker).await?;
    let channel = broker.channel().await?;
    declare_durable(&channel, DASHBOARD_LINKS_QUEUE).await?;

    for link in &rows {
        let payload = serde_json::to_vec(link)
            .map_err(|e| EsgError::InvalidInput(format!("link serialization failed: {e}")))?;
        publish_persistent(&channel, DASHBOARD_LINKS_QUEUE, &payload).await?;
    }

    info!(published = rows.len(), queue = DASHBOARD_LINKS_QUEUE, "Tick complete");
    Ok(())
}
