use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mongodb::bson::Document;
use mongodb::{Client, Collection};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use esglens_broker::Disposition;
use esglens_common::config::TelemetryConfig;
use esglens_common::POLLUTION_DATA_QUEUE;

const COLLECTION_NAME: &str = "pollution_records";
const CONNECT_ATTEMPTS: u32 = 10;
const CONNECT_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("esglens=info".parse()?))
        .init();

    info!("Telemetry sink starting");

    let config = TelemetryConfig::sink_from_env();
    let collection = Arc::new(connect_mongo(&config).await?);

    esglens_broker::consume(&config.broker, POLLUTION_DATA_QUEUE, move |body| {
        let collection = collection.clone();
        async move {
            // Malformed JSON is poison: log and ack so it never loops.
            let snapshot: serde_json::Value = match serde_json::from_slice(&body) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "Malformed snapshot JSON; dropping");
                    return Disposition::Ack;
                }
            };

            let document = match mongodb::bson::to_document(&snapshot) {
                Ok(document) => document,
                Err(e) => {
                    warn!(error = %e, "Snapshot not representable as BSON; dropping");
                    return Disposition::Ack;
                }
            };

            match collection.insert_one(document).await {
                Ok(result) => {
                    info!(id = %result.inserted_id, "Snapshot stored");
                    Disposition::Ack
                }
                Err(e) => {
                    // Store unreachable: dead-letter and let the next tick's
                    // snapshot try again on a fresh insert.
                    error!(error = %e, "Mongo insert failed");
                    Disposition::DeadLetter
                }
            }
        }
    })
    .await
}

/// Connect to the document store with bounded retries; the process exits
/// when the store never comes up.
async fn connect_mongo(config: &TelemetryConfig) -> Result<Collection<Document>> {
    let mut last_error = None;
    for attempt in 1..=CONNECT_ATTEMPTS {
        match Client::with_uri_str(&config.mongo_uri).await {
            Ok(client) => {
                let database = client.database(&config.mongo_db);
                match database.run_command(mongodb::bson::doc! { "ping": 1 }).await {
                    Ok(_) => {
                        info!("Connected to document store");
                        return Ok(database.collection::<Document>(COLLECTION_NAME));
                    }
                    Err(e) => last_error = Some(e),
                }
            }
            Err(e) => last_error = Some(e),
        }
        warn!(attempt, max = CONNECT_ATTEMPTS, "Document store not ready; retrying");
        tokio::time::sleep(CONNECT_DELAY).await;
    }
    anyhow::bail!(
        "document store unreachable after {CONNECT_ATTEMPTS} attempts: {:?}",
        last_error
    )
}
