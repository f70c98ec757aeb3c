use async_trait::async_trait;

use esglens_common::{DocumentKind, EsgError};

/// A report URL resolved for one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLink {
    pub url: String,
    pub year: i32,
    pub kind: DocumentKind,
}

/// Narrow seam over the filings site so the pipeline is testable with a
/// stub: given a symbol, return the company's report URLs.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_report_urls(&self, symbol: &str) -> Result<Vec<ReportLink>, EsgError>;
}
