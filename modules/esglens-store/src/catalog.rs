use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use esglens_common::EsgError;

#[derive(Clone)]
pub struct CatalogStore {
    pool: PgPool,
}

/// A row of the company catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: i32,
    pub company_name: String,
    pub industry: String,
    pub symbol: String,
    pub series: String,
    pub isin_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One record of the upstream constituents feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub company_name: String,
    pub industry: String,
    pub symbol: String,
    pub series: String,
    pub isin_code: String,
}

impl CatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Snapshot reconciliation: delete symbols absent from the feed, upsert
    /// the rest. One transaction, so a failure commits nothing.
    pub async fn sync(&self, entries: &[CatalogEntry]) -> Result<(), EsgError> {
        if entries.is_empty() {
            return Err(EsgError::InvalidInput("catalog feed produced no rows".into()));
        }

        let symbols: Vec<String> = entries.iter().map(|e| e.symbol.clone()).collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;

        let deleted = sqlx::query("DELETE FROM company_catalog WHERE symbol <> ALL($1)")
            .bind(&symbols)
            .execute(&mut *tx)
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?
            .rows_affected();

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO company_catalog (company_name, industry, symbol, series, isin_code)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (symbol, isin_code)
                DO UPDATE SET
                    company_name = EXCLUDED.company_name,
                    industry = EXCLUDED.industry,
                    series = EXCLUDED.series,
                    updated_at = NOW()
                "#,
            )
            .bind(&entry.company_name)
            .bind(&entry.industry)
            .bind(&entry.symbol)
            .bind(&entry.series)
            .bind(&entry.isin_code)
            .execute(&mut *tx)
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;

        info!(upserted = entries.len(), deleted, "Catalog synced");
        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<CompanyRow>, EsgError> {
        sqlx::query_as::<_, CompanyRow>("SELECT * FROM company_catalog ORDER BY symbol")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EsgError::Database(e.to_string()))
    }

    pub async fn by_id(&self, id: i32) -> Result<Option<CompanyRow>, EsgError> {
        sqlx::query_as::<_, CompanyRow>("SELECT * FROM company_catalog WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EsgError::Database(e.to_string()))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<CompanyRow>, EsgError> {
        let pattern = format!("%{}%", query.trim());
        sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT * FROM company_catalog
            WHERE company_name ILIKE $1 OR symbol ILIKE $1 OR industry ILIKE $1
            ORDER BY symbol
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))
    }
}
