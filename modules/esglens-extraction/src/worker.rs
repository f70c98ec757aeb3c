use std::sync::Arc;

use tracing::{info, warn};

use esglens_common::config::ExtractionConfig;
use esglens_common::{EsgError, ExtractionTask, ObjectKey};
use esglens_store::{ExtractedIndicatorRow, ExtractionStore, IndicatorStore, ScoreStore};

use crate::chain::ExtractionChain;
use crate::monitoring::{HealthChecker, MetricsCollector};

/// Confidence at or above which an extraction counts as clean in metrics.
const VALID_CONFIDENCE: f64 = 0.5;

pub struct ExtractionWorker {
    pub chain: ExtractionChain,
    pub indicators: IndicatorStore,
    pub extractions: ExtractionStore,
    pub scores: ScoreStore,
    pub config: ExtractionConfig,
    pub metrics: Arc<MetricsCollector>,
    pub health: Arc<HealthChecker>,
}

impl ExtractionWorker {
    /// Handle one `extraction-tasks` message end to end.
    pub async fn process(&self, body: &[u8]) -> Result<(), EsgError> {
        let task: ExtractionTask = serde_json::from_slice(body)
            .map_err(|e| EsgError::InvalidInput(format!("malformed task body: {e}")))?;
        let key = ObjectKey::parse(&task.object_key)?;

        info!(
            object_key = key.raw,
            company = key.symbol,
            year = key.year,
            "Extraction task received"
        );

        // Already-processed gate makes redelivery idempotent.
        if self.extractions.exists_for(&key.symbol, key.year).await? {
            info!(
                company = key.symbol,
                year = key.year,
                "Indicators already extracted; skipping"
            );
            return Ok(());
        }

        let tracker = self.metrics.start_document(&key.raw, &key.symbol, key.year);
        let result = self.extract_document(&key, tracker).await;
        self.health.update_extraction_status(result.is_ok());
        result
    }

    async fn extract_document(
        &self,
        key: &ObjectKey,
        mut tracker: crate::monitoring::DocumentTracker,
    ) -> Result<(), EsgError> {
        let grouped = self.indicators.grouped_by_attribute().await?;

        let mut rows: Vec<ExtractedIndicatorRow> = Vec::new();
        let mut confidences: Vec<f64> = Vec::new();
        let mut valid = 0u64;
        let mut invalid = 0u64;
        let mut warnings = 0u64;

        // Attributes ascend, indicators within an attribute run in catalog
        // order: determinism over throughput for a single document.
        for (attribute, indicators) in &grouped {
            info!(
                attribute,
                indicators = indicators.len(),
                company = key.symbol,
                year = key.year,
                "Extracting attribute group"
            );
            for indicator in indicators {
                let outcome = match self
                    .chain
                    .extract_indicator(indicator, &key.symbol, key.year)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        self.metrics.end_document(tracker, false);
                        return Err(e);
                    }
                };

                tracker.record_api_calls(outcome.api_calls, outcome.api_errors);
                confidences.push(outcome.row.confidence);
                if outcome.row.confidence == 0.0 {
                    invalid += 1;
                } else if outcome.row.confidence >= VALID_CONFIDENCE
                    && outcome.row.numeric_value.is_some()
                {
                    valid += 1;
                } else {
                    warnings += 1;
                }
                rows.push(outcome.row);
            }
        }

        tracker.record_extraction(rows.len() as u64, valid, invalid, warnings, &confidences);

        if let Err(e) = self.extractions.upsert_all(&rows).await {
            self.metrics.end_document(tracker, false);
            return Err(e);
        }

        self.score(key, &rows).await;
        self.metrics.end_document(tracker, true);
        Ok(())
    }

    /// Scoring runs in-process right after the upsert. A scoring failure is
    /// logged, not fatal: the extraction already committed and the API can
    /// retrigger scoring later.
    async fn score(&self, key: &ObjectKey, rows: &[ExtractedIndicatorRow]) {
        let definitions = match self.indicators.all().await {
            Ok(defs) => defs,
            Err(e) => {
                warn!(error = %e, "Could not load indicator catalog for scoring");
                return;
            }
        };

        let report = esglens_scoring::compute(
            &definitions,
            rows,
            self.config.pipeline.scoring_min_confidence,
        );

        if let Err(e) =
            esglens_scoring::persist(&self.scores, &key.symbol, key.year, &report).await
        {
            warn!(company = key.symbol, year = key.year, error = %e, "Score persistence failed");
        }
    }
}
