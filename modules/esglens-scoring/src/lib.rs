//! Per-pillar ESG scoring: polarity-aware normalization of extracted
//! indicator values, weighted aggregation, and an auditable breakdown.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use esglens_common::{EsgError, Pillar, Polarity};
use esglens_store::scores::ScoreUpsert;
use esglens_store::{ExtractedIndicatorRow, IndicatorDefinition, ScoreStore};

/// Normalize a raw value into [0, 100] against `[min, max]`. Values outside
/// the bounds clamp to the ends; polarity flips which end is "good".
pub fn normalize(value: f64, min: f64, max: f64, polarity: Polarity) -> f64 {
    let span = max - min;
    let fraction = match polarity {
        Polarity::HigherIsBetter => (value - min) / span,
        Polarity::LowerIsBetter => (max - value) / span,
    };
    fraction.clamp(0.0, 1.0) * 100.0
}

/// One indicator's contribution to its pillar score.
#[derive(Debug, Clone, Serialize)]
pub struct Contribution {
    pub code: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub normalized: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PillarBreakdown {
    pub score: Option<f64>,
    pub total_weight: f64,
    pub indicators: Vec<Contribution>,
}

/// The full scoring result for one (company, year).
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub pillars: BTreeMap<Pillar, PillarBreakdown>,
    pub overall: Option<f64>,
    pub min_confidence: f64,
}

/// Effective normalization bounds for an indicator. An industry baseline,
/// when set, spans zero to twice the baseline; otherwise the seeded
/// reference range applies. Degenerate or missing ranges disqualify the
/// indicator from aggregation.
fn bounds(def: &IndicatorDefinition) -> Option<(f64, f64)> {
    let (min, max) = match def.industry_baseline {
        Some(baseline) if baseline > 0.0 => (0.0, 2.0 * baseline),
        _ => (def.ref_min?, def.ref_max?),
    };
    if max <= min {
        return None;
    }
    Some((min, max))
}

/// Compute pillar and overall scores from the indicator catalog and the
/// extracted values. Indicators with no numeric value, confidence below the
/// gate, or unusable bounds are excluded, not counted as zero.
pub fn compute(
    definitions: &[IndicatorDefinition],
    extracted: &[ExtractedIndicatorRow],
    min_confidence: f64,
) -> ScoreReport {
    let by_code: BTreeMap<&str, &ExtractedIndicatorRow> = extracted
        .iter()
        .map(|row| (row.indicator_code.as_str(), row))
        .collect();

    let mut pillars: BTreeMap<Pillar, PillarBreakdown> = BTreeMap::new();
    for pillar in [Pillar::E, Pillar::S, Pillar::G] {
        pillars.insert(
            pillar,
            PillarBreakdown {
                score: None,
                total_weight: 0.0,
                indicators: Vec::new(),
            },
        );
    }

    for def in definitions {
        let Some(row) = by_code.get(def.indicator_code.as_str()) else {
            continue;
        };
        let Some(value) = row.numeric_value else {
            continue;
        };
        if row.confidence < min_confidence {
            continue;
        }
        let Some((min, max)) = bounds(def) else {
            continue;
        };

        let normalized = normalize(value, min, max, def.polarity());
        let entry = pillars.get_mut(&def.pillar()).expect("pillar map is total");
        entry.total_weight += def.weight;
        entry.indicators.push(Contribution {
            code: def.indicator_code.clone(),
            name: def.parameter_name.clone(),
            value,
            unit: row.unit.clone(),
            normalized,
            weight: def.weight,
            contribution: normalized * def.weight,
        });
    }

    for breakdown in pillars.values_mut() {
        if breakdown.total_weight > 0.0 {
            let weighted: f64 = breakdown.indicators.iter().map(|c| c.contribution).sum();
            breakdown.score = Some(weighted / breakdown.total_weight);
        }
    }

    let pillar_scores: Vec<f64> = pillars.values().filter_map(|b| b.score).collect();
    let overall = if pillar_scores.is_empty() {
        None
    } else {
        Some(pillar_scores.iter().sum::<f64>() / pillar_scores.len() as f64)
    };

    ScoreReport {
        pillars,
        overall,
        min_confidence,
    }
}

/// Persist a report: one row per pillar plus the OVERALL row.
pub async fn persist(
    store: &ScoreStore,
    company_name: &str,
    report_year: i32,
    report: &ScoreReport,
) -> Result<(), EsgError> {
    let mut upserts: Vec<ScoreUpsert> = report
        .pillars
        .iter()
        .map(|(pillar, breakdown)| ScoreUpsert {
            pillar: pillar.to_string(),
            score: breakdown.score,
            overall_score: None,
            breakdown: serde_json::to_value(breakdown).unwrap_or_default(),
        })
        .collect();

    upserts.push(ScoreUpsert {
        pillar: "OVERALL".to_string(),
        score: None,
        overall_score: report.overall,
        breakdown: serde_json::to_value(report).unwrap_or_default(),
    });

    store.upsert_all(company_name, report_year, &upserts).await?;

    info!(
        company = company_name,
        year = report_year,
        overall = ?report.overall,
        "Persisted ESG scores"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(code: &str, attribute: i16, weight: f64, polarity: &str, min: f64, max: f64) -> IndicatorDefinition {
        IndicatorDefinition {
            id: 0,
            indicator_code: code.to_string(),
            attribute_number: attribute,
            parameter_name: code.to_string(),
            measurement_unit: "unit".to_string(),
            description: String::new(),
            pillar: Pillar::of_attribute(attribute).unwrap().to_string(),
            weight,
            polarity: polarity.to_string(),
            ref_min: Some(min),
            ref_max: Some(max),
            industry_baseline: None,
        }
    }

    fn row(code: &str, value: Option<f64>, confidence: f64) -> ExtractedIndicatorRow {
        ExtractedIndicatorRow {
            company_name: "TESTCO".to_string(),
            report_year: 2024,
            indicator_code: code.to_string(),
            extracted_value: value.map(|v| v.to_string()).unwrap_or_default(),
            numeric_value: value,
            unit: "unit".to_string(),
            confidence,
            source_pages: vec![],
            source_chunks: vec![],
            reasoning: None,
            extracted_at: None,
        }
    }

    #[test]
    fn normalization_is_polarity_symmetric() {
        for v in [0.0, 12.5, 40.0, 99.9, 100.0] {
            let higher = normalize(v, 0.0, 100.0, Polarity::HigherIsBetter);
            let lower = normalize(v, 0.0, 100.0, Polarity::LowerIsBetter);
            assert!((higher + lower - 100.0).abs() < 1e-9, "v = {v}");
        }
    }

    #[test]
    fn values_below_min_clamp() {
        assert_eq!(normalize(-5.0, 0.0, 100.0, Polarity::HigherIsBetter), 0.0);
        assert_eq!(normalize(-5.0, 0.0, 100.0, Polarity::LowerIsBetter), 100.0);
    }

    #[test]
    fn values_above_max_clamp() {
        assert_eq!(normalize(250.0, 0.0, 100.0, Polarity::HigherIsBetter), 100.0);
        assert_eq!(normalize(250.0, 0.0, 100.0, Polarity::LowerIsBetter), 0.0);
    }

    #[test]
    fn negative_values_allowed_when_bounds_permit() {
        let n = normalize(-10.0, -20.0, 0.0, Polarity::HigherIsBetter);
        assert!((n - 50.0).abs() < 1e-9);
    }

    #[test]
    fn pillar_score_is_deterministic() {
        // E1 (80, higher) and E2 (20, lower) both normalize to 80.
        let defs = vec![
            def("E1", 1, 1.0, "higher_is_better", 0.0, 100.0),
            def("E2", 2, 1.0, "lower_is_better", 0.0, 100.0),
        ];
        let rows = vec![row("E1", Some(80.0), 0.9), row("E2", Some(20.0), 0.9)];
        let report = compute(&defs, &rows, 0.3);
        let e = &report.pillars[&Pillar::E];
        assert!((e.score.unwrap() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn low_confidence_rows_are_excluded() {
        let defs = vec![def("E1", 1, 1.0, "higher_is_better", 0.0, 100.0)];
        let rows = vec![row("E1", Some(80.0), 0.1)];
        let report = compute(&defs, &rows, 0.3);
        assert_eq!(report.pillars[&Pillar::E].score, None);
        assert_eq!(report.overall, None);
    }

    #[test]
    fn missing_indicators_count_as_no_data() {
        let defs = vec![
            def("E1", 1, 1.0, "higher_is_better", 0.0, 100.0),
            def("S1", 5, 1.0, "higher_is_better", 0.0, 100.0),
        ];
        let rows = vec![row("E1", Some(50.0), 0.9)];
        let report = compute(&defs, &rows, 0.3);
        assert!(report.pillars[&Pillar::E].score.is_some());
        assert_eq!(report.pillars[&Pillar::S].score, None);
        // Overall averages only the non-null pillars.
        assert!((report.overall.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn null_numeric_value_is_excluded() {
        let defs = vec![def("E1", 1, 1.0, "higher_is_better", 0.0, 100.0)];
        let rows = vec![row("E1", None, 0.9)];
        let report = compute(&defs, &rows, 0.3);
        assert_eq!(report.pillars[&Pillar::E].score, None);
    }

    #[test]
    fn industry_baseline_overrides_reference_bounds() {
        let mut d = def("E1", 1, 1.0, "lower_is_better", 0.0, 100.0);
        d.industry_baseline = Some(50.0);
        let rows = vec![row("E1", Some(50.0), 0.9)];
        let report = compute(&[d], &rows, 0.3);
        // At exactly the baseline the value sits mid-range.
        assert!((report.pillars[&Pillar::E].score.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn weights_shift_the_aggregate() {
        let defs = vec![
            def("E1", 1, 3.0, "higher_is_better", 0.0, 100.0),
            def("E2", 1, 1.0, "higher_is_better", 0.0, 100.0),
        ];
        let rows = vec![row("E1", Some(100.0), 0.9), row("E2", Some(0.0), 0.9)];
        let report = compute(&defs, &rows, 0.3);
        assert!((report.pillars[&Pillar::E].score.unwrap() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn overall_is_mean_of_pillars() {
        let defs = vec![
            def("E1", 1, 1.0, "higher_is_better", 0.0, 100.0),
            def("S1", 5, 1.0, "higher_is_better", 0.0, 100.0),
            def("G1", 8, 1.0, "higher_is_better", 0.0, 100.0),
        ];
        let rows = vec![
            row("E1", Some(60.0), 0.9),
            row("S1", Some(90.0), 0.9),
            row("G1", Some(30.0), 0.9),
        ];
        let report = compute(&defs, &rows, 0.3);
        assert!((report.overall.unwrap() - 60.0).abs() < 1e-9);
    }
}
