use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use esglens_common::EsgError;

#[derive(Clone)]
pub struct ExtractionStore {
    pool: PgPool,
}

/// Structured value the model extracted for one (company, year, indicator).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExtractedIndicatorRow {
    pub company_name: String,
    pub report_year: i32,
    pub indicator_code: String,
    pub extracted_value: String,
    pub numeric_value: Option<f64>,
    pub unit: String,
    pub confidence: f64,
    pub source_pages: Vec<i32>,
    pub source_chunks: Vec<i32>,
    pub reasoning: Option<String>,
    #[serde(skip_serializing)]
    #[sqlx(default)]
    pub extracted_at: Option<DateTime<Utc>>,
}

impl ExtractionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Already-processed gate for the extraction worker.
    pub async fn exists_for(&self, company_name: &str, report_year: i32) -> Result<bool, EsgError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM extracted_indicators WHERE company_name = $1 AND report_year = $2",
        )
        .bind(company_name)
        .bind(report_year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Upsert every extracted indicator for one document in a single
    /// transaction. Conflict on the natural key replaces the prior row.
    pub async fn upsert_all(&self, rows: &[ExtractedIndicatorRow]) -> Result<(), EsgError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO extracted_indicators
                    (company_name, report_year, indicator_code, extracted_value, numeric_value,
                     unit, confidence, source_pages, source_chunks, reasoning)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (company_name, report_year, indicator_code)
                DO UPDATE SET
                    extracted_value = EXCLUDED.extracted_value,
                    numeric_value = EXCLUDED.numeric_value,
                    unit = EXCLUDED.unit,
                    confidence = EXCLUDED.confidence,
                    source_pages = EXCLUDED.source_pages,
                    source_chunks = EXCLUDED.source_chunks,
                    reasoning = EXCLUDED.reasoning,
                    extracted_at = NOW()
                "#,
            )
            .bind(&row.company_name)
            .bind(row.report_year)
            .bind(&row.indicator_code)
            .bind(&row.extracted_value)
            .bind(row.numeric_value)
            .bind(&row.unit)
            .bind(row.confidence)
            .bind(&row.source_pages)
            .bind(&row.source_chunks)
            .bind(&row.reasoning)
            .execute(&mut *tx)
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;

        info!(
            company = rows[0].company_name,
            year = rows[0].report_year,
            indicators = rows.len(),
            "Upserted extracted indicators"
        );
        Ok(())
    }

    pub async fn for_company_year(
        &self,
        company_name: &str,
        report_year: i32,
    ) -> Result<Vec<ExtractedIndicatorRow>, EsgError> {
        sqlx::query_as::<_, ExtractedIndicatorRow>(
            r#"
            SELECT company_name, report_year, indicator_code, extracted_value, numeric_value,
                   unit, confidence, source_pages, source_chunks, reasoning, extracted_at
            FROM extracted_indicators
            WHERE company_name = $1 AND report_year = $2
            ORDER BY indicator_code
            "#,
        )
        .bind(company_name)
        .bind(report_year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))
    }
}
