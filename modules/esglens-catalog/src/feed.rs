use serde::Deserialize;

use esglens_common::EsgError;
use esglens_store::catalog::CatalogEntry;

/// Column layout of the index-constituents CSV feed.
#[derive(Debug, Deserialize)]
struct FeedRecord {
    #[serde(rename = "Company Name")]
    company_name: String,
    #[serde(rename = "Industry")]
    industry: String,
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Series")]
    series: String,
    #[serde(rename = "ISIN Code")]
    isin_code: String,
}

/// Parse the feed body into catalog entries. An empty or header-only feed is
/// a hard failure; the sync must not run against it.
pub fn parse_feed(body: &str) -> Result<Vec<CatalogEntry>, EsgError> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let mut entries = Vec::new();

    for record in reader.deserialize::<FeedRecord>() {
        let record =
            record.map_err(|e| EsgError::InvalidInput(format!("unparseable feed row: {e}")))?;
        entries.push(CatalogEntry {
            company_name: record.company_name.trim().to_string(),
            industry: record.industry.trim().to_string(),
            symbol: record.symbol.trim().to_string(),
            series: record.series.trim().to_string(),
            isin_code: record.isin_code.trim().to_string(),
        });
    }

    if entries.is_empty() {
        return Err(EsgError::InvalidInput("catalog feed is empty".into()));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
Company Name,Industry,Symbol,Series,ISIN Code
Reliance Industries Ltd.,Oil Gas & Consumable Fuels,RELIANCE,EQ,INE002A01018
Tata Consultancy Services Ltd.,Information Technology,TCS,EQ,INE467B01029
";

    #[test]
    fn parses_feed_rows() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].symbol, "RELIANCE");
        assert_eq!(entries[0].isin_code, "INE002A01018");
        assert_eq!(entries[1].industry, "Information Technology");
    }

    #[test]
    fn empty_feed_is_rejected() {
        assert!(parse_feed("Company Name,Industry,Symbol,Series,ISIN Code\n").is_err());
        assert!(parse_feed("").is_err());
    }

    #[test]
    fn malformed_row_is_rejected() {
        let bad = "Company Name,Industry,Symbol,Series,ISIN Code\nonly,three,cols\n";
        assert!(parse_feed(bad).is_err());
    }
}
