use std::marker::PhantomData;

use anyhow::{anyhow, Result};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::schema::StructuredOutput;
use super::types::*;
use super::Gemini;
use crate::util::strip_code_blocks;

pub struct GeminiPromptBuilder {
    agent: Gemini,
    input: String,
    preamble: Option<String>,
    temperature: Option<f32>,
}

impl GeminiPromptBuilder {
    pub(crate) fn new(agent: Gemini, input: String) -> Self {
        Self {
            agent,
            input,
            preamble: None,
            temperature: None,
        }
    }

    pub fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Create a structured output builder for extracting typed data.
    pub fn output<T: DeserializeOwned + JsonSchema + Send + 'static>(
        self,
    ) -> GeminiOutputBuilder<T> {
        GeminiOutputBuilder {
            builder: self,
            _phantom: PhantomData,
        }
    }

    /// Send as free-form text generation.
    pub async fn send(self) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content::user(&self.input)],
            system_instruction: self.preamble.as_deref().map(Content::system),
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
                response_mime_type: None,
                response_schema: None,
            }),
        };

        self.agent.client().generate(&self.agent.model, &request).await
    }
}

pub struct GeminiOutputBuilder<T> {
    builder: GeminiPromptBuilder,
    _phantom: PhantomData<T>,
}

impl<T: DeserializeOwned + JsonSchema + Send + 'static> GeminiOutputBuilder<T> {
    pub async fn send(self) -> Result<T> {
        let schema = T::gemini_schema();

        debug!(type_name = T::type_name(), "Gemini structured output extraction");

        let request = GenerateRequest {
            contents: vec![Content::user(&self.builder.input)],
            system_instruction: self.builder.preamble.as_deref().map(Content::system),
            generation_config: Some(GenerationConfig {
                temperature: self.builder.temperature,
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema),
            }),
        };

        let json_str = self
            .builder
            .agent
            .client()
            .generate(&self.builder.agent.model, &request)
            .await?;

        serde_json::from_str(strip_code_blocks(&json_str))
            .map_err(|e| anyhow!("Failed to deserialize response: {}", e))
    }
}
