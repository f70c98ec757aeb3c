use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use esglens_broker::Disposition;
use esglens_common::config::ExtractionConfig;
use esglens_common::EXTRACTION_QUEUE;
use esglens_store::{EmbeddingStore, ExtractionStore, IndicatorStore, ScoreStore};
use genai_client::gemini::Gemini;

mod chain;
mod monitoring;
mod query;
mod worker;

use chain::ExtractionChain;
use monitoring::{HealthChecker, MetricsCollector, MonitorState};
use worker::ExtractionWorker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("esglens=info".parse()?))
        .init();

    info!("Extraction worker starting");

    let config = ExtractionConfig::from_env();
    config.model.log_redacted();

    let pool = esglens_store::connect(&config.database).await?;
    esglens_store::migrate(&pool).await?;

    let generator = Gemini::new(&config.model.gen_api_key, &config.model.gen_model);
    let embedder = Gemini::new(&config.model.embed_api_key, &config.model.gen_model)
        .with_embedding_model(&config.model.embed_model)
        .with_embedding_dimensions(config.model.embed_dimensions);

    let chain = ExtractionChain::new(
        generator,
        embedder,
        EmbeddingStore::new(pool.clone()),
        config.pipeline.extract_top_k,
        config.model.gen_temperature,
    );

    let metrics = Arc::new(MetricsCollector::new());
    let health = Arc::new(HealthChecker::new());

    monitoring::server::spawn(
        MonitorState {
            metrics: metrics.clone(),
            health: health.clone(),
        },
        config.monitor_port,
    );

    let worker = Arc::new(ExtractionWorker {
        chain,
        indicators: IndicatorStore::new(pool.clone()),
        extractions: ExtractionStore::new(pool.clone()),
        scores: ScoreStore::new(pool),
        config: config.clone(),
        metrics,
        health,
    });

    esglens_broker::consume(&config.broker, EXTRACTION_QUEUE, move |body| {
        let worker = worker.clone();
        async move {
            match worker.process(&body).await {
                Ok(()) => Disposition::Ack,
                Err(e) => {
                    error!(kind = ?e.kind(), error = %e, "Extraction task failed");
                    Disposition::DeadLetter
                }
            }
        }
    })
    .await
}
