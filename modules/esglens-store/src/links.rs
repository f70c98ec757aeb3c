use sqlx::PgPool;

use esglens_common::{DashboardLink, EsgError};

/// Registry of live-dashboard URLs, one per tracked industry site. Seeded
/// by operators; read by the telemetry scheduler.
#[derive(Clone)]
pub struct LinkStore {
    pool: PgPool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LinkRow {
    id: i32,
    company_name: String,
    industry_name: String,
    state_name: String,
    detail_page_url: String,
}

impl LinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn all(&self) -> Result<Vec<DashboardLink>, EsgError> {
        let rows = sqlx::query_as::<_, LinkRow>(
            "SELECT id, company_name, industry_name, state_name, detail_page_url
             FROM live_dashboard_links ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| DashboardLink {
                id: r.id,
                company_name: r.company_name,
                industry_name: r.industry_name,
                state_name: r.state_name,
                detail_page_url: r.detail_page_url,
            })
            .collect())
    }
}
