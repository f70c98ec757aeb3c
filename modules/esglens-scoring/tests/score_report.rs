//! Scoring scenarios across the full report shape: pillar aggregation,
//! overall averaging, and the auditable breakdown.

use esglens_common::Pillar;
use esglens_store::{ExtractedIndicatorRow, IndicatorDefinition};
use esglens_scoring::compute;

fn def(
    code: &str,
    attribute: i16,
    weight: f64,
    polarity: &str,
    min: f64,
    max: f64,
) -> IndicatorDefinition {
    IndicatorDefinition {
        id: 0,
        indicator_code: code.to_string(),
        attribute_number: attribute,
        parameter_name: format!("{code} parameter"),
        measurement_unit: "MT".to_string(),
        description: String::new(),
        pillar: Pillar::of_attribute(attribute).unwrap().to_string(),
        weight,
        polarity: polarity.to_string(),
        ref_min: Some(min),
        ref_max: Some(max),
        industry_baseline: None,
    }
}

fn extracted(code: &str, value: f64, confidence: f64) -> ExtractedIndicatorRow {
    ExtractedIndicatorRow {
        company_name: "RELIANCE".to_string(),
        report_year: 2024,
        indicator_code: code.to_string(),
        extracted_value: value.to_string(),
        numeric_value: Some(value),
        unit: "MT".to_string(),
        confidence,
        source_pages: vec![4],
        source_chunks: vec![0],
        reasoning: None,
        extracted_at: None,
    }
}

#[test]
fn mixed_polarity_pillar_is_deterministic() {
    // E1 at 80 (higher-is-better) and E2 at 20 (lower-is-better) both
    // normalize to 80, so the equally-weighted pillar lands on 80 exactly.
    let defs = vec![
        def("E1", 1, 1.0, "higher_is_better", 0.0, 100.0),
        def("E2", 2, 1.0, "lower_is_better", 0.0, 100.0),
    ];
    let rows = vec![extracted("E1", 80.0, 0.9), extracted("E2", 20.0, 0.9)];

    let report = compute(&defs, &rows, 0.3);
    assert!((report.pillars[&Pillar::E].score.unwrap() - 80.0).abs() < 1e-9);
}

#[test]
fn breakdown_lists_every_contributing_indicator() {
    let defs = vec![
        def("E1", 1, 2.0, "higher_is_better", 0.0, 100.0),
        def("S1", 5, 1.0, "lower_is_better", 0.0, 10.0),
        def("G1", 9, 1.0, "lower_is_better", 0.0, 50.0),
    ];
    let rows = vec![
        extracted("E1", 60.0, 0.8),
        extracted("S1", 2.0, 0.7),
        extracted("G1", 100.0, 0.9), // above max, clamps to 0
    ];

    let report = compute(&defs, &rows, 0.3);

    let e = &report.pillars[&Pillar::E];
    assert_eq!(e.indicators.len(), 1);
    assert_eq!(e.indicators[0].code, "E1");
    assert!((e.indicators[0].contribution - 120.0).abs() < 1e-9);

    let s = &report.pillars[&Pillar::S];
    assert!((s.indicators[0].normalized - 80.0).abs() < 1e-9);

    let g = &report.pillars[&Pillar::G];
    assert_eq!(g.indicators[0].normalized, 0.0);
    assert_eq!(g.score, Some(0.0));
}

#[test]
fn breakdown_serializes_for_the_audit_blob() {
    let defs = vec![def("E1", 1, 1.0, "higher_is_better", 0.0, 100.0)];
    let rows = vec![extracted("E1", 42.0, 0.9)];
    let report = compute(&defs, &rows, 0.3);

    let blob = serde_json::to_value(&report).unwrap();
    let e = &blob["pillars"]["E"];
    assert!((e["score"].as_f64().unwrap() - 42.0).abs() < 1e-9);
    assert_eq!(e["indicators"][0]["code"], "E1");
    assert_eq!(e["indicators"][0]["weight"], 1.0);
    assert_eq!(blob["min_confidence"], 0.3);
}

#[test]
fn all_pillars_null_makes_overall_null() {
    let defs = vec![def("E1", 1, 1.0, "higher_is_better", 0.0, 100.0)];
    let rows = vec![extracted("E1", 50.0, 0.1)]; // below the gate
    let report = compute(&defs, &rows, 0.3);
    assert!(report.pillars.values().all(|p| p.score.is_none()));
    assert_eq!(report.overall, None);
}
