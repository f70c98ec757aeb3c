//! Fixture-driven path from rendered dashboard HTML to the stored snapshot
//! document, covering the sentinel and the JSON shape the sink persists.

use esglens_common::DashboardLink;
use esglens_telemetry::scrape::extract_blocks;
use esglens_telemetry::snapshot::{build_snapshot, NOT_OPERATIONAL_SENTINEL};

fn fixture_link() -> DashboardLink {
    DashboardLink {
        id: 7,
        company_name: "Acme Chemicals".to_string(),
        industry_name: "Acme Chemicals Unit III".to_string(),
        state_name: "Gujarat".to_string(),
        detail_page_url: "https://dashboard.example/unit3".to_string(),
    }
}

fn dashboard_page() -> String {
    format!(
        r#"<html><body>
          <h2>Continuous Emission Monitoring</h2>
          <hr/>
          <div>
            <div>
              <label>Stack1</label>
              <label>PM</label><label>25</label><label>10:00 Time</label>
              <label>SO2</label><label>{sentinel}</label><label>10:00 Time</label>
            </div>
            <div>
              <label>ETP Outlet</label>
              <label>pH</label><label>7.4</label><label>10:05 Time</label>
            </div>
          </div>
        </body></html>"#,
        sentinel = NOT_OPERATIONAL_SENTINEL
    )
}

#[test]
fn full_page_becomes_a_structured_snapshot() {
    let blocks = extract_blocks(&dashboard_page());
    let snapshot = build_snapshot(&fixture_link(), &blocks);

    assert_eq!(snapshot.company_name, "Acme Chemicals");
    assert_eq!(snapshot.pollution_data.len(), 2);

    let pm = &snapshot.pollution_data["Stack1"]["PM"];
    assert_eq!(pm.status, "Operational");
    assert_eq!(pm.value.as_deref(), Some("25"));
    assert_eq!(pm.time.as_deref(), Some("10:00"));

    let so2 = &snapshot.pollution_data["Stack1"]["SO2"];
    assert_eq!(so2.status, "Not Operational");
    assert!(so2.value.is_none());
}

#[test]
fn snapshot_document_round_trips_like_the_sink_path() {
    let blocks = extract_blocks(&dashboard_page());
    let snapshot = build_snapshot(&fixture_link(), &blocks);

    // The sink stores the JSON body verbatim; reading it back must yield an
    // equivalent document.
    let body = serde_json::to_vec(&snapshot).unwrap();
    let read_back: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(read_back["industry_name"], "Acme Chemicals Unit III");
    assert_eq!(read_back["pollution_data"]["ETP Outlet"]["pH"]["value"], "7.4");
    assert!(read_back["scraped_datetime_utc"].is_string());
}

#[test]
fn maintenance_page_produces_an_empty_snapshot() {
    let blocks = extract_blocks("<html><body><p>down for maintenance</p></body></html>");
    let snapshot = build_snapshot(&fixture_link(), &blocks);
    assert!(snapshot.pollution_data.is_empty());
}
