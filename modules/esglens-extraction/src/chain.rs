use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, warn};

use esglens_common::{with_retry, EsgError, RetryPolicy};
use esglens_store::{EmbeddingStore, ExtractedIndicatorRow, IndicatorDefinition, RetrievedChunk};
use genai_client::gemini::Gemini;
use genai_client::traits::EmbedAgent;

use crate::query::build_search_query;

/// Closed schema the generative model must fill per indicator.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct IndicatorExtraction {
    /// Verbatim text supporting the value, or "not found".
    pub extracted_value: String,
    /// The value parsed as a number, when one is present.
    pub numeric_value: Option<f64>,
    /// Unit of the reported value.
    pub unit: String,
    /// Extraction confidence between 0 and 1.
    pub confidence: f64,
    /// Page numbers the value was read from.
    pub source_pages: Vec<i32>,
    /// Chunk indices the value was read from.
    pub source_chunks: Vec<i32>,
    /// Short justification of the answer.
    pub reasoning: Option<String>,
}

/// Result of one indicator extraction plus its API accounting.
pub struct ChainOutcome {
    pub row: ExtractedIndicatorRow,
    pub api_calls: u64,
    pub api_errors: u64,
}

/// Retrieval-augmented extraction: embed a per-indicator query, fetch the
/// nearest chunks of the document, and ask the generative model for a typed
/// answer.
pub struct ExtractionChain {
    generator: Gemini,
    embedder: Gemini,
    embeddings: EmbeddingStore,
    top_k: i64,
    temperature: f32,
}

impl ExtractionChain {
    pub fn new(
        generator: Gemini,
        embedder: Gemini,
        embeddings: EmbeddingStore,
        top_k: usize,
        temperature: f32,
    ) -> Self {
        Self {
            generator,
            embedder,
            embeddings,
            top_k: top_k as i64,
            temperature,
        }
    }

    /// Extract one indicator. Model failure after retries produces a
    /// zero-confidence row, never an error: a bad indicator must not abort
    /// the document batch.
    pub async fn extract_indicator(
        &self,
        indicator: &IndicatorDefinition,
        company_name: &str,
        report_year: i32,
    ) -> Result<ChainOutcome, EsgError> {
        let query = build_search_query(indicator);
        debug!(indicator = indicator.indicator_code, query, "Built search query");

        let mut api_calls = 0u64;
        let mut api_errors = 0u64;

        api_calls += 1;
        let query_vector = with_retry(RetryPolicy::default(), "query-embed", || async {
            self.embedder.embed(&query).await
        })
        .await
        .map_err(|e| {
            EsgError::Embedding(format!("query embedding failed: {e}"))
        })?;

        let chunks = self
            .embeddings
            .search_filtered(query_vector, company_name, report_year, self.top_k)
            .await?;

        if chunks.is_empty() {
            debug!(
                indicator = indicator.indicator_code,
                company_name, report_year, "No chunks matched; synthesizing not-found"
            );
            return Ok(ChainOutcome {
                row: self.not_found_row(indicator, company_name, report_year, "no matching chunks"),
                api_calls,
                api_errors,
            });
        }

        api_calls += 1;
        let extraction = with_retry(RetryPolicy::default(), "extraction-chain", || async {
            self.generator
                .prompt(user_prompt(indicator, &chunks))
                .preamble(SYSTEM_PROMPT)
                .temperature(self.temperature)
                .output::<IndicatorExtraction>()
                .send()
                .await
        })
        .await;

        let row = match extraction {
            Ok(parsed) => self.row_from(parsed, indicator, company_name, report_year),
            Err(e) => {
                api_errors += 1;
                warn!(
                    indicator = indicator.indicator_code,
                    error = %e,
                    "Extraction chain failed after retries"
                );
                self.not_found_row(
                    indicator,
                    company_name,
                    report_year,
                    &format!("extraction failed: {e}"),
                )
            }
        };

        Ok(ChainOutcome {
            row,
            api_calls,
            api_errors,
        })
    }

    fn row_from(
        &self,
        parsed: IndicatorExtraction,
        indicator: &IndicatorDefinition,
        company_name: &str,
        report_year: i32,
    ) -> ExtractedIndicatorRow {
        ExtractedIndicatorRow {
            company_name: company_name.to_string(),
            report_year,
            // The catalog code is authoritative; the model does not pick it.
            indicator_code: indicator.indicator_code.clone(),
            extracted_value: parsed.extracted_value,
            numeric_value: parsed.numeric_value,
            unit: if parsed.unit.is_empty() {
                indicator.measurement_unit.clone()
            } else {
                parsed.unit
            },
            confidence: parsed.confidence.clamp(0.0, 1.0),
            source_pages: parsed.source_pages,
            source_chunks: parsed.source_chunks,
            reasoning: parsed.reasoning,
            extracted_at: None,
        }
    }

    fn not_found_row(
        &self,
        indicator: &IndicatorDefinition,
        company_name: &str,
        report_year: i32,
        reason: &str,
    ) -> ExtractedIndicatorRow {
        ExtractedIndicatorRow {
            company_name: company_name.to_string(),
            report_year,
            indicator_code: indicator.indicator_code.clone(),
            extracted_value: "not found".to_string(),
            numeric_value: None,
            unit: indicator.measurement_unit.clone(),
            confidence: 0.0,
            source_pages: vec![],
            source_chunks: vec![],
            reasoning: Some(reason.to_string()),
            extracted_at: None,
        }
    }
}

const SYSTEM_PROMPT: &str = "You extract ESG disclosure values from Indian BRSR and annual \
reports. Answer only from the provided context. When the context does not state the value, \
return \"not found\" with confidence 0. Report numbers exactly as disclosed, without converting \
units, and cite the pages and chunks you used.";

fn user_prompt(indicator: &IndicatorDefinition, chunks: &[RetrievedChunk]) -> String {
    let context = format_context(chunks);
    format!(
        "Indicator: {code}\nParameter: {name}\nUnit: {unit}\nPillar: {pillar}\nDescription: {description}\n\n\
         Context from the company's report:\n{context}\n\n\
         Extract the value of this indicator for the reporting year.",
        code = indicator.indicator_code,
        name = indicator.parameter_name,
        unit = indicator.measurement_unit,
        pillar = indicator.pillar,
        description = indicator.description,
    )
}

/// Context block: every chunk annotated with its position so the model can
/// cite pages and chunks.
fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[Page {}, Chunk {}] {}", c.page_number, c.chunk_index, c.chunk_text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use genai_client::gemini::StructuredOutput;

    fn chunk(page: i32, index: i32, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            page_number: page,
            chunk_index: index,
            chunk_text: text.to_string(),
            distance: 0.1,
        }
    }

    #[test]
    fn context_is_annotated_with_positions() {
        let chunks = vec![
            chunk(4, 0, "Scope 1 emissions were 1250 MT CO2e."),
            chunk(7, 2, "Renewable share reached 45%."),
        ];
        let context = format_context(&chunks);
        assert!(context.contains("[Page 4, Chunk 0] Scope 1 emissions"));
        assert!(context.contains("[Page 7, Chunk 2] Renewable"));
    }

    #[test]
    fn extraction_schema_is_closed_and_total() {
        let schema = IndicatorExtraction::gemini_schema();
        let text = serde_json::to_string(&schema).unwrap();
        assert!(!text.contains("additionalProperties"));
        let required = schema["required"].as_array().unwrap();
        for field in [
            "extracted_value",
            "numeric_value",
            "unit",
            "confidence",
            "source_pages",
            "source_chunks",
            "reasoning",
        ] {
            assert!(
                required.iter().any(|v| v == field),
                "{field} missing from required"
            );
        }
    }

    #[test]
    fn extraction_output_parses_from_json() {
        let json = r#"{
            "extracted_value": "1,250 MT CO2e",
            "numeric_value": 1250.0,
            "unit": "MT CO2e",
            "confidence": 0.92,
            "source_pages": [4],
            "source_chunks": [0],
            "reasoning": "stated directly in the emissions table"
        }"#;
        let parsed: IndicatorExtraction = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.numeric_value, Some(1250.0));
        assert_eq!(parsed.source_pages, vec![4]);
    }
}
