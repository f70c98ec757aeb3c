use sqlx::PgPool;

use esglens_common::{DocumentKind, EsgError, IngestionStatus};

#[derive(Clone)]
pub struct IngestionStore {
    pool: PgPool,
}

impl IngestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a downloaded filing. Returns false when the object key is
    /// already tracked (insert-if-absent).
    pub async fn insert_if_absent(
        &self,
        symbol: &str,
        object_key: &str,
        kind: DocumentKind,
        report_year: i32,
    ) -> Result<bool, EsgError> {
        let result = sqlx::query(
            r#"
            INSERT INTO ingestion_metadata (company_symbol, object_key, document_kind, report_year, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            ON CONFLICT (object_key) DO NOTHING
            "#,
        )
        .bind(symbol)
        .bind(object_key)
        .bind(kind.to_string())
        .bind(report_year)
        .execute(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(&self, object_key: &str) -> Result<bool, EsgError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ingestion_metadata WHERE object_key = $1",
        )
        .bind(object_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    pub async fn set_status(
        &self,
        object_key: &str,
        status: IngestionStatus,
    ) -> Result<(), EsgError> {
        sqlx::query(
            "UPDATE ingestion_metadata SET status = $2, updated_at = NOW() WHERE object_key = $1",
        )
        .bind(object_key)
        .bind(status.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))?;
        Ok(())
    }
}
