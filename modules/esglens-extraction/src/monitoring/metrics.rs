use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Bounded ring of recently processed documents.
const RECENT_CAPACITY: usize = 100;

/// Everything tracked for one document run.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMetrics {
    pub object_key: String,
    pub company_name: String,
    pub report_year: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub processing_time_seconds: f64,
    pub indicators_extracted: u64,
    pub indicators_valid: u64,
    pub indicators_invalid: u64,
    pub validation_warnings: u64,
    pub avg_confidence: f64,
    pub api_calls: u64,
    pub api_errors: u64,
    pub success: bool,
}

/// Live handle for a document in flight.
pub struct DocumentTracker {
    metrics: DocumentMetrics,
    started: Instant,
}

impl DocumentTracker {
    pub fn record_extraction(
        &mut self,
        extracted: u64,
        valid: u64,
        invalid: u64,
        warnings: u64,
        confidences: &[f64],
    ) {
        self.metrics.indicators_extracted = extracted;
        self.metrics.indicators_valid = valid;
        self.metrics.indicators_invalid = invalid;
        self.metrics.validation_warnings = warnings;
        if !confidences.is_empty() {
            self.metrics.avg_confidence =
                confidences.iter().sum::<f64>() / confidences.len() as f64;
        }
    }

    pub fn record_api_calls(&mut self, calls: u64, errors: u64) {
        self.metrics.api_calls += calls;
        self.metrics.api_errors += errors;
    }
}

#[derive(Default)]
struct Totals {
    documents: u64,
    successes: u64,
    indicators: u64,
    processing_seconds: f64,
}

/// Aggregates per-document runs; shared between the worker loop and the
/// monitoring HTTP server.
pub struct MetricsCollector {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    totals: Totals,
    recent: VecDeque<DocumentMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn start_document(&self, object_key: &str, company_name: &str, report_year: i32) -> DocumentTracker {
        DocumentTracker {
            metrics: DocumentMetrics {
                object_key: object_key.to_string(),
                company_name: company_name.to_string(),
                report_year,
                started_at: Utc::now(),
                finished_at: None,
                processing_time_seconds: 0.0,
                indicators_extracted: 0,
                indicators_valid: 0,
                indicators_invalid: 0,
                validation_warnings: 0,
                avg_confidence: 0.0,
                api_calls: 0,
                api_errors: 0,
                success: false,
            },
            started: Instant::now(),
        }
    }

    pub fn end_document(&self, mut tracker: DocumentTracker, success: bool) {
        tracker.metrics.finished_at = Some(Utc::now());
        tracker.metrics.processing_time_seconds = tracker.started.elapsed().as_secs_f64();
        tracker.metrics.success = success;

        let mut inner = self.inner.lock().expect("metrics lock poisoned");
        inner.totals.documents += 1;
        if success {
            inner.totals.successes += 1;
        }
        inner.totals.indicators += tracker.metrics.indicators_extracted;
        inner.totals.processing_seconds += tracker.metrics.processing_time_seconds;

        if inner.recent.len() == RECENT_CAPACITY {
            inner.recent.pop_front();
        }
        inner.recent.push_back(tracker.metrics);
    }

    pub fn aggregate(&self) -> serde_json::Value {
        let inner = self.inner.lock().expect("metrics lock poisoned");
        let totals = &inner.totals;
        let success_rate = if totals.documents > 0 {
            totals.successes as f64 / totals.documents as f64
        } else {
            0.0
        };
        let avg_processing = if totals.documents > 0 {
            totals.processing_seconds / totals.documents as f64
        } else {
            0.0
        };

        serde_json::json!({
            "total_documents_processed": totals.documents,
            "total_successes": totals.successes,
            "total_failures": totals.documents - totals.successes,
            "success_rate": success_rate,
            "total_indicators_extracted": totals.indicators,
            "avg_processing_time_seconds": avg_processing,
            "recent_documents": inner.recent.iter().collect::<Vec<_>>(),
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_one_document_lifecycle() {
        let collector = MetricsCollector::new();
        let mut tracker = collector.start_document("TEST/2024_BRSR_aa.pdf", "TEST", 2024);
        tracker.record_extraction(5, 4, 1, 2, &[0.85, 0.90, 0.88, 0.92, 0.87]);
        tracker.record_api_calls(11, 1);
        collector.end_document(tracker, true);

        let agg = collector.aggregate();
        assert_eq!(agg["total_documents_processed"], 1);
        assert_eq!(agg["total_indicators_extracted"], 5);
        assert_eq!(agg["success_rate"], 1.0);
        let recent = agg["recent_documents"].as_array().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0]["api_calls"], 11);
        assert!((recent[0]["avg_confidence"].as_f64().unwrap() - 0.884).abs() < 1e-9);
    }

    #[test]
    fn recent_ring_is_bounded() {
        let collector = MetricsCollector::new();
        for i in 0..150 {
            let tracker = collector.start_document(&format!("C{i}/2024_AR_x.pdf"), "C", 2024);
            collector.end_document(tracker, i % 2 == 0);
        }
        let agg = collector.aggregate();
        assert_eq!(agg["total_documents_processed"], 150);
        assert_eq!(agg["recent_documents"].as_array().unwrap().len(), 100);
    }

    #[test]
    fn failures_lower_the_success_rate() {
        let collector = MetricsCollector::new();
        let t1 = collector.start_document("A/2024_AR_x.pdf", "A", 2024);
        collector.end_document(t1, true);
        let t2 = collector.start_document("B/2024_AR_x.pdf", "B", 2024);
        collector.end_document(t2, false);
        let agg = collector.aggregate();
        assert_eq!(agg["success_rate"], 0.5);
        assert_eq!(agg["total_failures"], 1);
    }
}
