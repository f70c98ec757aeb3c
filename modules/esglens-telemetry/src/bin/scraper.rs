use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use esglens_broker::{declare_durable, publish_persistent, Broker, Disposition};
use esglens_common::config::TelemetryConfig;
use esglens_common::{DashboardLink, EsgError, DASHBOARD_LINKS_QUEUE, POLLUTION_DATA_QUEUE};
use esglens_telemetry::{scrape, snapshot};
use headless_client::HeadlessClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("esglens=info".parse()?))
        .init();

    info!("Telemetry scraper starting");

    let config = Arc::new(TelemetryConfig::from_env());
    let browser = Arc::new(HeadlessClient::new(
        &config.browser.endpoint,
        config.browser.token.as_deref(),
    ));

    let consume_config = config.clone();
    esglens_broker::consume(&consume_config.broker, DASHBOARD_LINKS_QUEUE, move |body| {
        let config = config.clone();
        let browser = browser.clone();
        async move {
            // Scrape failures ack anyway: the next scheduler tick reissues
            // the URL, so there is nothing to dead-letter.
            if let Err(e) = handle(&config, &browser, &body).await {
                warn!(error = %e, "Scrape failed; waiting for next tick");
            }
            Disposition::Ack
        }
    })
    .await
}

async fn handle(
    config: &TelemetryConfig,
    browser: &HeadlessClient,
    body: &[u8],
) -> Result<(), EsgError> {
    let link: DashboardLink = serde_json::from_slice(body)
        .map_err(|e| EsgError::InvalidInput(format!("malformed link message: {e}")))?;

    if link.detail_page_url.is_empty() {
        warn!(industry = link.industry_name, "Link has no URL; skipping");
        return Ok(());
    }

    info!(industry = link.industry_name, url = link.detail_page_url, "Scraping dashboard");

    let html = browser
        .content_with_wait(&link.detail_page_url, scrape::WIDGET_SELECTOR)
        .await
        .map_err(|e| EsgError::Scraping(format!("render failed: {e}")))?;

    let blocks = scrape::extract_blocks(&html);
    let snap = snapshot::build_snapshot(&link, &blocks);

    if snap.pollution_data.is_empty() {
        warn!(industry = link.industry_name, "No telemetry blocks found on page");
        return Ok(());
    }

    let payload = serde_json::to_vec(&snap)
        .map_err(|e| EsgError::InvalidInput(format!("snapshot serialization failed: {e}")))?;

    let broker = Broker::connect(&config.broker).await?;
    let channel = broker.channel().await?;
    declare_durable(&channel, POLLUTION_DATA_QUEUE).await?;
    publish_persistent(&channel, POLLUTION_DATA_QUEUE, &payload).await?;

    info!(
        industry = link.industry_name,
        parents = snap.pollution_data.len(),
        "Snapshot published"
    );
    Ok(())
}
