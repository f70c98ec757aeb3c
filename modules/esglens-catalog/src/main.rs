use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use esglens_common::config::CatalogConfig;
use esglens_common::{with_retry, RetryPolicy};
use esglens_store::CatalogStore;

mod feed;

const FEED_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("esglens=info".parse()?))
        .init();

    info!("Catalog sync starting");

    let config = CatalogConfig::from_env();

    let http = reqwest::Client::builder()
        .timeout(FEED_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?;

    let body = with_retry(RetryPolicy::default(), "catalog-feed", || async {
        let response = http.get(&config.feed_url).send().await?;
        response.error_for_status()?.text().await
    })
    .await?;

    let entries = feed::parse_feed(&body)?;
    info!(rows = entries.len(), "Feed fetched and parsed");

    let pool = esglens_store::connect(&config.database).await?;
    esglens_store::migrate(&pool).await?;

    CatalogStore::new(pool).sync(&entries).await?;

    info!("Catalog sync complete");
    Ok(())
}
