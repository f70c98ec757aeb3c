use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use esglens_broker::Disposition;
use esglens_common::config::EmbeddingsConfig;
use esglens_common::EMBEDDING_QUEUE;
use esglens_store::{EmbeddingStore, IngestionStore, ObjectStore};
use genai_client::gemini::Gemini;

mod pdftext;
mod splitter;
mod worker;

use worker::EmbeddingsWorker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("esglens=info".parse()?))
        .init();

    info!("Embeddings worker starting");

    let config = EmbeddingsConfig::from_env();
    config.model.log_redacted();

    let pool = esglens_store::connect(&config.database).await?;
    esglens_store::migrate(&pool).await?;

    let embedder = Gemini::new(&config.model.embed_api_key, &config.model.gen_model)
        .with_embedding_model(&config.model.embed_model)
        .with_embedding_dimensions(config.model.embed_dimensions);

    let worker = Arc::new(EmbeddingsWorker {
        objects: ObjectStore::new(&config.object_store),
        embeddings: EmbeddingStore::new(pool.clone()),
        ingestion: IngestionStore::new(pool),
        embedder,
        config: config.clone(),
    });

    esglens_broker::consume(&config.broker, EMBEDDING_QUEUE, move |body| {
        let worker = worker.clone();
        async move {
            let object_key = match String::from_utf8(body) {
                Ok(key) => key,
                Err(e) => {
                    error!(error = %e, "Message body is not UTF-8");
                    return Disposition::DeadLetter;
                }
            };

            match worker.process(object_key.trim()).await {
                Ok(()) => Disposition::Ack,
                Err(e) => {
                    error!(object_key, kind = ?e.kind(), error = %e, "Processing failed");
                    Disposition::DeadLetter
                }
            }
        }
    })
    .await
}
