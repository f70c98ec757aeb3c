use std::time::Duration;

use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use esglens_broker::{declare_durable, publish_persistent, Broker, Channel};
use esglens_common::config::IngestConfig;
use esglens_common::{DocumentKind, EsgError, EMBEDDING_QUEUE};
use esglens_store::{CatalogStore, IngestionStore, ObjectStore};
use headless_client::HeadlessClient;

mod filings;
mod traits;

use filings::FilingsPage;
use traits::{ReportLink, ReportSource};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_FILINGS_URL: &str =
    "https://www.nseindia.com/companies-listing/corporate-filings-annual-reports?symbol={symbol}";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("esglens=info".parse()?))
        .init();

    info!("Filings ingestion starting");

    let config = IngestConfig::from_env();

    let pool = esglens_store::connect(&config.database).await?;
    esglens_store::migrate(&pool).await?;

    let catalog = CatalogStore::new(pool.clone());
    let ingestion = IngestionStore::new(pool);

    let objects = ObjectStore::new(&config.object_store);
    objects.ensure_bucket().await?;

    let broker = Broker::connect(&config.broker).await?;
    let channel = broker.channel().await?;
    declare_durable(&channel, EMBEDDING_QUEUE).await?;

    let browser = HeadlessClient::new(&config.browser.endpoint, config.browser.token.as_deref());
    let url_template = std::env::var("FILINGS_URL_TEMPLATE")
        .unwrap_or_else(|_| DEFAULT_FILINGS_URL.to_string());
    let source = FilingsPage::new(browser, url_template);

    let http = reqwest::Client::builder().timeout(DOWNLOAD_TIMEOUT).build()?;

    let companies = catalog.all().await?;
    info!(companies = companies.len(), "Resolving report URLs");

    let mut ingested = 0usize;
    let mut failed = 0usize;

    for company in &companies {
        match ingest_company(
            &source,
            &http,
            &objects,
            &ingestion,
            &channel,
            &company.symbol,
        )
        .await
        {
            Ok(count) => ingested += count,
            Err(e) => {
                // One company must not sink the batch.
                warn!(symbol = company.symbol, error = %e, "Company ingestion failed");
                failed += 1;
            }
        }
    }

    info!(ingested, failed, "Filings ingestion complete");
    Ok(())
}

async fn ingest_company(
    source: &dyn ReportSource,
    http: &reqwest::Client,
    objects: &ObjectStore,
    ingestion: &IngestionStore,
    channel: &Channel,
    symbol: &str,
) -> Result<usize, EsgError> {
    let links = source.fetch_report_urls(symbol).await?;
    if links.is_empty() {
        info!(symbol, "No report URLs resolved");
        return Ok(0);
    }

    let mut stored = 0usize;
    for link in links {
        match ingest_report(http, objects, ingestion, channel, symbol, &link).await {
            Ok(true) => stored += 1,
            Ok(false) => {}
            Err(e) => warn!(symbol, url = link.url, error = %e, "Report ingestion failed"),
        }
    }
    Ok(stored)
}

/// Download one report, store it under a deterministic key and enqueue it.
/// Returns false when the key was already tracked.
async fn ingest_report(
    http: &reqwest::Client,
    objects: &ObjectStore,
    ingestion: &IngestionStore,
    channel: &Channel,
    symbol: &str,
    link: &ReportLink,
) -> Result<bool, EsgError> {
    let response = http
        .get(&link.url)
        .send()
        .await
        .map_err(|e| EsgError::Scraping(format!("download failed: {e}")))?;
    let body = response
        .error_for_status()
        .map_err(|e| EsgError::Scraping(format!("download failed: {e}")))?
        .bytes()
        .await
        .map_err(|e| EsgError::Scraping(format!("download body failed: {e}")))?;

    let key = object_key(symbol, link.year, link.kind, &body);

    if ingestion.exists(&key).await? {
        info!(key, "Already ingested; skipping");
        return Ok(false);
    }

    objects.put(&key, body.to_vec()).await?;
    ingestion
        .insert_if_absent(symbol, &key, link.kind, link.year)
        .await?;

    publish_persistent(channel, EMBEDDING_QUEUE, key.as_bytes()).await?;
    info!(key, "Report ingested and queued");
    Ok(true)
}

/// Deterministic object key: `<SYMBOL>/<year>_<KIND>_<hash12>.pdf`.
fn object_key(symbol: &str, year: i32, kind: DocumentKind, body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let hash = &hex::encode(digest)[..12];
    format!("{symbol}/{year}_{kind}_{hash}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_is_deterministic() {
        let a = object_key("RELIANCE", 2024, DocumentKind::Brsr, b"pdf-bytes");
        let b = object_key("RELIANCE", 2024, DocumentKind::Brsr, b"pdf-bytes");
        assert_eq!(a, b);
        assert!(a.starts_with("RELIANCE/2024_BRSR_"));
        assert!(a.ends_with(".pdf"));
    }

    #[test]
    fn object_key_changes_with_content() {
        let a = object_key("TCS", 2023, DocumentKind::AnnualReport, b"v1");
        let b = object_key("TCS", 2023, DocumentKind::AnnualReport, b"v2");
        assert_ne!(a, b);
    }

    #[test]
    fn object_key_parses_back() {
        let key = object_key("INFY", 2024, DocumentKind::AnnualReport, b"x");
        let parsed = esglens_common::ObjectKey::parse(&key).unwrap();
        assert_eq!(parsed.symbol, "INFY");
        assert_eq!(parsed.year, 2024);
    }
}
