use std::io::Write;

use tempfile::NamedTempFile;
use tracing::debug;

use esglens_common::EsgError;

/// Extract text page by page from PDF bytes. Pages come back 1-indexed;
/// empty pages are kept here (chunking skips them) so page numbers stay
/// aligned with the document.
pub fn extract_pages(pdf_bytes: &[u8], use_ocr: bool) -> Result<Vec<(i32, String)>, EsgError> {
    // pdf-extract wants a path; spill the object to a scratch file.
    let mut scratch = NamedTempFile::new()
        .map_err(|e| EsgError::Extraction(format!("scratch file failed: {e}")))?;
    scratch
        .write_all(pdf_bytes)
        .map_err(|e| EsgError::Extraction(format!("scratch write failed: {e}")))?;

    let pages = pdf_extract::extract_text_by_pages(scratch.path())
        .map_err(|e| EsgError::Extraction(format!("pdf text extraction failed: {e}")))?;

    debug!(pages = pages.len(), "Extracted PDF pages");

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let page_number = i as i32 + 1;
            let text = if text.trim().is_empty() && use_ocr {
                ocr_page(page_number).unwrap_or(text)
            } else {
                text
            };
            (page_number, text)
        })
        .collect())
}

/// OCR hook for scanned pages. Currently a no-op; wire a tesseract-backed
/// implementation here when image-only filings show up in practice.
fn ocr_page(_page_number: i32) -> Option<String> {
    None
}
