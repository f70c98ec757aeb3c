use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use esglens_common::{DocumentKind, EsgError};
use headless_client::HeadlessClient;

use crate::traits::{ReportLink, ReportSource};

/// Resolves annual-report PDFs by rendering the exchange's filings page for
/// a symbol through the remote headless browser and harvesting PDF anchors.
pub struct FilingsPage {
    browser: HeadlessClient,
    url_template: String,
}

impl FilingsPage {
    pub fn new(browser: HeadlessClient, url_template: String) -> Self {
        Self { browser, url_template }
    }

    fn page_url(&self, symbol: &str) -> String {
        self.url_template.replace("{symbol}", symbol)
    }
}

#[async_trait]
impl ReportSource for FilingsPage {
    async fn fetch_report_urls(&self, symbol: &str) -> Result<Vec<ReportLink>, EsgError> {
        let url = self.page_url(symbol);
        debug!(symbol, url, "Rendering filings page");

        let html = self
            .browser
            .content_with_wait(&url, "a[href$='.pdf']")
            .await
            .map_err(|e| EsgError::Scraping(format!("filings page for {symbol}: {e}")))?;

        Ok(extract_report_links(&html))
    }
}

/// Harvest PDF links from a rendered filings page. The report year is read
/// from the anchor text (falling back to the URL); anchors without one are
/// skipped. Anchors mentioning BRSR are classified as BRSR filings.
pub fn extract_report_links(html: &str) -> Vec<ReportLink> {
    let document = Html::parse_document(html);
    let anchor = Selector::parse("a[href]").expect("static selector");
    let year_re = Regex::new(r"\b(19|20)\d{2}\b").expect("static regex");

    let mut links = Vec::new();
    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.to_lowercase().ends_with(".pdf") {
            continue;
        }

        let text: String = element.text().collect::<Vec<_>>().join(" ");
        let year = year_re
            .find(&text)
            .or_else(|| year_re.find(href))
            .and_then(|m| m.as_str().parse::<i32>().ok());
        let Some(year) = year else {
            continue;
        };

        let haystack = format!("{} {}", text.to_uppercase(), href.to_uppercase());
        let kind = if haystack.contains("BRSR") {
            DocumentKind::Brsr
        } else {
            DocumentKind::AnnualReport
        };

        links.push(ReportLink {
            url: href.to_string(),
            year,
            kind,
        });
    }

    links.sort_by(|a, b| a.url.cmp(&b.url));
    links.dedup();
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <a href="https://reports.example.com/rel/annual-report-2024.pdf">Annual Report 2024</a>
          <a href="https://reports.example.com/rel/brsr_2024.pdf">BRSR Disclosure 2024</a>
          <a href="https://reports.example.com/rel/presentation.pdf">Investor deck</a>
          <a href="https://example.com/about">About us</a>
        </body></html>
    "#;

    #[test]
    fn harvests_pdf_links_with_years() {
        let links = extract_report_links(PAGE);
        assert_eq!(links.len(), 2);
        assert!(links.iter().all(|l| l.year == 2024));
    }

    #[test]
    fn classifies_brsr_filings() {
        let links = extract_report_links(PAGE);
        let brsr = links.iter().find(|l| l.url.contains("brsr")).unwrap();
        assert_eq!(brsr.kind, DocumentKind::Brsr);
        let ar = links.iter().find(|l| l.url.contains("annual")).unwrap();
        assert_eq!(ar.kind, DocumentKind::AnnualReport);
    }

    #[test]
    fn skips_non_pdf_and_yearless_anchors() {
        let links = extract_report_links(PAGE);
        assert!(links.iter().all(|l| l.url.ends_with(".pdf")));
        assert!(!links.iter().any(|l| l.url.contains("presentation")));
    }

    #[test]
    fn year_falls_back_to_url() {
        let html = r#"<a href="/docs/2023_report.pdf">Download</a>"#;
        let links = extract_report_links(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].year, 2023);
    }
}
