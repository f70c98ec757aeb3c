use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::EsgError;

// --- Queue names (shared wiring between workers) ---

pub const EMBEDDING_QUEUE: &str = "embedding-tasks";
pub const EXTRACTION_QUEUE: &str = "extraction-tasks";
pub const DASHBOARD_LINKS_QUEUE: &str = "dashboard_links_queue";
pub const POLLUTION_DATA_QUEUE: &str = "pollution_data_queue";

// --- ESG dimensions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Pillar {
    E,
    S,
    G,
}

impl Pillar {
    /// BRSR Core attribute → pillar mapping. Attributes 1..4 are
    /// environmental, 5..7 social, 8..9 governance.
    pub fn of_attribute(attribute: i16) -> Option<Pillar> {
        match attribute {
            1..=4 => Some(Pillar::E),
            5..=7 => Some(Pillar::S),
            8..=9 => Some(Pillar::G),
            _ => None,
        }
    }
}

impl std::fmt::Display for Pillar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pillar::E => write!(f, "E"),
            Pillar::S => write!(f, "S"),
            Pillar::G => write!(f, "G"),
        }
    }
}

impl std::str::FromStr for Pillar {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "E" => Ok(Pillar::E),
            "S" => Ok(Pillar::S),
            "G" => Ok(Pillar::G),
            other => Err(format!("unknown pillar: {other}")),
        }
    }
}

/// Whether higher or lower raw values are better for an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl std::str::FromStr for Polarity {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "higher_is_better" => Ok(Polarity::HigherIsBetter),
            "lower_is_better" => Ok(Polarity::LowerIsBetter),
            other => Err(format!("unknown polarity: {other}")),
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::HigherIsBetter => write!(f, "higher_is_better"),
            Polarity::LowerIsBetter => write!(f, "lower_is_better"),
        }
    }
}

/// Lifecycle of a downloaded filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestionStatus {
    Pending,
    Processing,
    Success,
    Failure,
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionStatus::Pending => write!(f, "PENDING"),
            IngestionStatus::Processing => write!(f, "PROCESSING"),
            IngestionStatus::Success => write!(f, "SUCCESS"),
            IngestionStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    AnnualReport,
    Brsr,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::AnnualReport => write!(f, "AR"),
            DocumentKind::Brsr => write!(f, "BRSR"),
        }
    }
}

// --- Object keys ---

/// Parsed form of an object-store key `<SYMBOL>/<YYYY>_<TYPE>_<hash>.pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    pub symbol: String,
    pub year: i32,
    pub raw: String,
}

impl ObjectKey {
    /// Parse a key. Keys that do not carry the `SYMBOL/YYYY_...` prefix are
    /// rejected as permanent-input errors.
    pub fn parse(raw: &str) -> Result<ObjectKey, EsgError> {
        let (symbol, rest) = raw
            .split_once('/')
            .ok_or_else(|| EsgError::InvalidInput(format!("object key missing '/': {raw}")))?;
        if symbol.is_empty() {
            return Err(EsgError::InvalidInput(format!("object key missing symbol: {raw}")));
        }
        let year_part = rest.split('_').next().unwrap_or("");
        let year: i32 = year_part.parse().map_err(|_| {
            EsgError::InvalidInput(format!("object key missing report year: {raw}"))
        })?;
        if !(1900..=2100).contains(&year) {
            return Err(EsgError::InvalidInput(format!(
                "object key year out of range: {raw}"
            )));
        }
        Ok(ObjectKey {
            symbol: symbol.to_string(),
            year,
            raw: raw.to_string(),
        })
    }
}

/// Body of an `extraction-tasks` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTask {
    pub object_key: String,
}

// --- Telemetry ---

/// One reading inside a telemetry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub status: String,
    pub value: Option<String>,
    pub time: Option<String>,
}

impl Measurement {
    pub fn operational(value: &str, time: &str) -> Self {
        Self {
            status: "Operational".to_string(),
            value: Some(value.to_string()),
            time: Some(time.to_string()),
        }
    }

    pub fn not_operational() -> Self {
        Self {
            status: "Not Operational".to_string(),
            value: None,
            time: None,
        }
    }
}

/// One scrape of one industry dashboard. Appended to the document store
/// verbatim; never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub company_name: String,
    pub industry_name: String,
    pub state_name: String,
    pub url: String,
    pub pollution_data: BTreeMap<String, BTreeMap<String, Measurement>>,
    pub scraped_datetime_utc: DateTime<Utc>,
}

/// Row of the live-dashboard link table, also the body of a
/// `dashboard_links_queue` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardLink {
    pub id: i32,
    pub company_name: String,
    pub industry_name: String,
    pub state_name: String,
    pub detail_page_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn attribute_pillar_mapping_is_total() {
        for attr in 1..=9 {
            let pillar = Pillar::of_attribute(attr).expect("attribute in 1..9 must map");
            let expected = match attr {
                1..=4 => Pillar::E,
                5..=7 => Pillar::S,
                _ => Pillar::G,
            };
            assert_eq!(pillar, expected, "attribute {attr}");
        }
        assert_eq!(Pillar::of_attribute(0), None);
        assert_eq!(Pillar::of_attribute(10), None);
    }

    #[test]
    fn pillar_round_trips_via_str() {
        for p in [Pillar::E, Pillar::S, Pillar::G] {
            assert_eq!(Pillar::from_str(&p.to_string()).unwrap(), p);
        }
    }

    #[test]
    fn object_key_parses() {
        let key = ObjectKey::parse("RELIANCE/2024_BRSR_ab12cd34ef56.pdf").unwrap();
        assert_eq!(key.symbol, "RELIANCE");
        assert_eq!(key.year, 2024);
    }

    #[test]
    fn object_key_rejects_bad_shapes() {
        assert!(ObjectKey::parse("no-slash.pdf").is_err());
        assert!(ObjectKey::parse("/2024_BRSR.pdf").is_err());
        assert!(ObjectKey::parse("TCS/notayear_BRSR.pdf").is_err());
        assert!(ObjectKey::parse("TCS/999999_BRSR.pdf").is_err());
    }

    #[test]
    fn extraction_task_wire_format() {
        let task = ExtractionTask {
            object_key: "TCS/2023_AR_0011223344aa.pdf".into(),
        };
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(json, r#"{"object_key":"TCS/2023_AR_0011223344aa.pdf"}"#);
    }

    #[test]
    fn measurement_constructors() {
        let up = Measurement::operational("25", "10:00");
        assert_eq!(up.status, "Operational");
        assert_eq!(up.value.as_deref(), Some("25"));
        let down = Measurement::not_operational();
        assert_eq!(down.status, "Not Operational");
        assert!(down.value.is_none() && down.time.is_none());
    }
}
