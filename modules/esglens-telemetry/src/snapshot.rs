use std::collections::BTreeMap;

use chrono::Utc;

use esglens_common::{DashboardLink, Measurement, TelemetrySnapshot};

/// Value the dashboard shows when a monitoring station is offline.
pub const NOT_OPERATIONAL_SENTINEL: &str = "Currently Plant or OCEMS or both not operational";

/// Structure the raw widget blocks into the snapshot map. Each block is a
/// parent parameter label followed by repeating (measurement, value, time)
/// triples; incomplete trailing triples are dropped.
pub fn parse_blocks(
    blocks: &[Vec<String>],
) -> BTreeMap<String, BTreeMap<String, Measurement>> {
    let mut structured = BTreeMap::new();

    for block in blocks {
        let Some(parent_label) = block.first() else {
            continue;
        };

        let mut measurements = BTreeMap::new();
        let mut i = 1;
        while i < block.len() {
            if i + 2 < block.len() {
                let measurement = block[i].trim().to_string();
                let value = block[i + 1].trim();
                let time = block[i + 2].replace(" Time", "").trim().to_string();

                let entry = if value == NOT_OPERATIONAL_SENTINEL {
                    Measurement::not_operational()
                } else {
                    Measurement::operational(value, &time)
                };
                measurements.insert(measurement, entry);
            }
            i += 3;
        }

        structured.insert(parent_label.trim().to_string(), measurements);
    }

    structured
}

/// Assemble the full snapshot for one dashboard link, stamped UTC now.
pub fn build_snapshot(
    link: &DashboardLink,
    blocks: &[Vec<String>],
) -> TelemetrySnapshot {
    TelemetrySnapshot {
        company_name: link.company_name.clone(),
        industry_name: link.industry_name.clone(),
        state_name: link.state_name.clone(),
        url: link.detail_page_url.clone(),
        pollution_data: parse_blocks(blocks),
        scraped_datetime_utc: Utc::now(),
    }
}
