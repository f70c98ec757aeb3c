mod client;
mod prompt_builder;
pub mod schema;
mod types;

pub use prompt_builder::{GeminiOutputBuilder, GeminiPromptBuilder};
pub use schema::StructuredOutput;

use anyhow::Result;
use async_trait::async_trait;

use crate::traits::EmbedAgent;
use client::GeminiClient;

/// Gemini agent: one generative model plus one embedding model behind the
/// same API key.
#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    pub(crate) model: String,
    embedding_model: String,
    embedding_dimensions: Option<usize>,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            embedding_model: "gemini-embedding-001".to_string(),
            embedding_dimensions: None,
            base_url: None,
        }
    }

    pub fn with_embedding_model(mut self, model: &str) -> Self {
        self.embedding_model = model.to_string();
        self
    }

    /// Request a fixed output dimensionality from the embedding model.
    pub fn with_embedding_dimensions(mut self, dimensions: usize) -> Self {
        self.embedding_dimensions = Some(dimensions);
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn prompt(&self, input: impl Into<String>) -> GeminiPromptBuilder {
        GeminiPromptBuilder::new(self.clone(), input.into())
    }

    pub(crate) fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key);
        match &self.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        }
    }
}

#[async_trait]
impl EmbedAgent for Gemini {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .client()
            .embed_batch(
                &self.embedding_model,
                self.embedding_dimensions,
                &[text.to_string()],
            )
            .await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding in response"))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.client()
            .embed_batch(&self.embedding_model, self.embedding_dimensions, &texts)
            .await
    }
}
