use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::debug;

use super::types::*;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const EMBED_TIMEOUT: Duration = Duration::from_secs(30);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) struct GeminiClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub async fn generate(&self, model: &str, request: &GenerateRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        debug!(model, "Gemini generate request");

        let response = self
            .http
            .post(&url)
            .timeout(GENERATE_TIMEOUT)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.text().ok_or_else(|| anyhow!("No candidates in Gemini response"))
    }

    pub async fn embed_batch(
        &self,
        model: &str,
        dimensions: Option<usize>,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>> {
        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.base_url, model, self.api_key
        );

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| EmbedRequest {
                    model: format!("models/{model}"),
                    content: Content::user(t),
                    output_dimensionality: dimensions,
                })
                .collect(),
        };

        debug!(model, batch = texts.len(), "Gemini batch embedding request");

        let response = self
            .http
            .post(&url)
            .timeout(EMBED_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!(
                "Gemini embedding error ({}): {}",
                status,
                error_text
            ));
        }

        let parsed: BatchEmbedResponse = response.json().await?;

        if parsed.embeddings.len() != texts.len() {
            return Err(anyhow!(
                "Gemini returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            ));
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}
