use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;
use sqlx::PgPool;

use esglens_common::{EsgError, Pillar, Polarity};

#[derive(Clone)]
pub struct IndicatorStore {
    pool: PgPool,
}

/// One entry of the BRSR Core indicator catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct IndicatorDefinition {
    pub id: i32,
    pub indicator_code: String,
    pub attribute_number: i16,
    pub parameter_name: String,
    pub measurement_unit: String,
    pub description: String,
    pub pillar: String,
    pub weight: f64,
    pub polarity: String,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
    pub industry_baseline: Option<f64>,
}

impl IndicatorDefinition {
    pub fn pillar(&self) -> Pillar {
        Pillar::from_str(&self.pillar).unwrap_or(Pillar::G)
    }

    pub fn polarity(&self) -> Polarity {
        Polarity::from_str(&self.polarity).unwrap_or(Polarity::HigherIsBetter)
    }
}

impl IndicatorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn all(&self) -> Result<Vec<IndicatorDefinition>, EsgError> {
        sqlx::query_as::<_, IndicatorDefinition>(
            "SELECT * FROM brsr_indicators ORDER BY attribute_number, indicator_code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))
    }

    /// The catalog grouped by attribute number. The worker walks attributes
    /// in ascending order, so a BTreeMap keeps iteration deterministic.
    pub async fn grouped_by_attribute(
        &self,
    ) -> Result<BTreeMap<i16, Vec<IndicatorDefinition>>, EsgError> {
        let all = self.all().await?;
        if all.is_empty() {
            return Err(EsgError::Config(
                "brsr_indicators table is empty; seed migration missing".into(),
            ));
        }
        let mut grouped: BTreeMap<i16, Vec<IndicatorDefinition>> = BTreeMap::new();
        for indicator in all {
            grouped.entry(indicator.attribute_number).or_default().push(indicator);
        }
        Ok(grouped)
    }
}
