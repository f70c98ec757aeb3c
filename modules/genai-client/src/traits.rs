use anyhow::Result;
use async_trait::async_trait;

/// Embedding capability: text in, fixed-dimension vectors out.
#[async_trait]
pub trait EmbedAgent: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}
