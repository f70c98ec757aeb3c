use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use esglens_common::EsgError;

#[derive(Clone)]
pub struct ScoreStore {
    pool: PgPool,
}

/// Persisted pillar (or overall) score with its audit breakdown.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ScoreRow {
    pub company_name: String,
    pub report_year: i32,
    pub pillar: String,
    pub score: Option<f64>,
    pub overall_score: Option<f64>,
    pub breakdown: serde_json::Value,
    pub computed_at: DateTime<Utc>,
}

/// Score to persist (the store stamps `computed_at`).
#[derive(Debug, Clone)]
pub struct ScoreUpsert {
    pub pillar: String,
    pub score: Option<f64>,
    pub overall_score: Option<f64>,
    pub breakdown: serde_json::Value,
}

impl ScoreStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace all score rows for one (company, year) in a single transaction.
    pub async fn upsert_all(
        &self,
        company_name: &str,
        report_year: i32,
        scores: &[ScoreUpsert],
    ) -> Result<(), EsgError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;

        for score in scores {
            sqlx::query(
                r#"
                INSERT INTO esg_scores (company_name, report_year, pillar, score, overall_score, breakdown)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (company_name, report_year, pillar)
                DO UPDATE SET
                    score = EXCLUDED.score,
                    overall_score = EXCLUDED.overall_score,
                    breakdown = EXCLUDED.breakdown,
                    computed_at = NOW()
                "#,
            )
            .bind(company_name)
            .bind(report_year)
            .bind(&score.pillar)
            .bind(score.score)
            .bind(score.overall_score)
            .bind(&score.breakdown)
            .execute(&mut *tx)
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| EsgError::Database(e.to_string()))
    }

    pub async fn for_company_year(
        &self,
        company_name: &str,
        report_year: i32,
    ) -> Result<Vec<ScoreRow>, EsgError> {
        sqlx::query_as::<_, ScoreRow>(
            r#"
            SELECT company_name, report_year, pillar, score, overall_score, breakdown, computed_at
            FROM esg_scores
            WHERE company_name = $1 AND report_year = $2
            ORDER BY pillar
            "#,
        )
        .bind(company_name)
        .bind(report_year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))
    }

    /// Latest scored year for a company, if any.
    pub async fn latest_year(&self, company_name: &str) -> Result<Option<i32>, EsgError> {
        sqlx::query_scalar("SELECT MAX(report_year) FROM esg_scores WHERE company_name = $1")
            .bind(company_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| EsgError::Database(e.to_string()))
    }
}
