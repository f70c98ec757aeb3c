//! Persistence for the pipeline: the Postgres stores (one per table
//! family, all wrapping the shared pool) and the S3 object store.

pub mod auth;
pub mod catalog;
pub mod embeddings;
pub mod extraction;
pub mod indicators;
pub mod ingestion;
pub mod links;
pub mod object;
pub mod scores;

pub use auth::AuthStore;
pub use catalog::{CatalogStore, CompanyRow};
pub use embeddings::{ChunkRow, EmbeddingStore, RetrievedChunk};
pub use extraction::{ExtractedIndicatorRow, ExtractionStore};
pub use indicators::{IndicatorDefinition, IndicatorStore};
pub use ingestion::IngestionStore;
pub use links::LinkStore;
pub use object::ObjectStore;
pub use scores::{ScoreRow, ScoreStore};

use esglens_common::config::DatabaseConfig;
use esglens_common::EsgError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect a pool against the configured database.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, EsgError> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.url())
        .await
        .map_err(|e| EsgError::Database(format!("connect failed: {e}")))
}

/// Run the embedded SQL migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), EsgError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| EsgError::Database(format!("migration failed: {e}")))?;
    Ok(())
}
