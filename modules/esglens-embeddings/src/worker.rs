use tracing::{info, warn};

use esglens_broker::{declare_durable, publish_persistent, Broker};
use esglens_common::config::EmbeddingsConfig;
use esglens_common::{
    with_retry, EsgError, ExtractionTask, IngestionStatus, ObjectKey, RetryPolicy,
    EXTRACTION_QUEUE,
};
use esglens_store::{ChunkRow, EmbeddingStore, IngestionStore, ObjectStore};
use genai_client::traits::EmbedAgent;

use crate::pdftext;
use crate::splitter::{pages_to_chunks, PageChunk};

/// Outcome per chunk, carried through the pipeline so dimension checks and
/// drop counts are first-class.
#[derive(Debug, Clone)]
pub enum ChunkEmbedding {
    Embedded(Vec<f32>),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyText,
    BatchFailed,
    DimensionMismatch(usize),
}

pub struct EmbeddingsWorker<E: EmbedAgent> {
    pub objects: ObjectStore,
    pub embeddings: EmbeddingStore,
    pub ingestion: IngestionStore,
    pub embedder: E,
    pub config: EmbeddingsConfig,
}

impl<E: EmbedAgent> EmbeddingsWorker<E> {
    /// Full pipeline for one queue message. Errors bubble to the consumer
    /// loop, which dead-letters the message.
    pub async fn process(&self, raw_key: &str) -> Result<(), EsgError> {
        let key = ObjectKey::parse(raw_key)?;
        info!(object_key = raw_key, "Processing document");

        // Idempotency gate: redelivery must not duplicate rows.
        if self.embeddings.exists_for_key(raw_key).await? {
            info!(object_key = raw_key, "Embeddings already stored; skipping");
            return Ok(());
        }

        self.ingestion
            .set_status(raw_key, IngestionStatus::Processing)
            .await?;

        let result = self.embed_document(&key).await;
        match result {
            Ok(stored) if stored > 0 => {
                self.ingestion
                    .set_status(raw_key, IngestionStatus::Success)
                    .await?;
                self.fan_out(raw_key).await;
                Ok(())
            }
            Ok(_) => {
                warn!(object_key = raw_key, "No embeddings produced");
                self.ingestion
                    .set_status(raw_key, IngestionStatus::Failure)
                    .await?;
                Ok(())
            }
            Err(e) => {
                self.ingestion
                    .set_status(raw_key, IngestionStatus::Failure)
                    .await
                    .ok();
                Err(e)
            }
        }
    }

    async fn embed_document(&self, key: &ObjectKey) -> Result<usize, EsgError> {
        let pdf_bytes = self.objects.get(&key.raw).await?;
        let pages = pdftext::extract_pages(&pdf_bytes, self.config.pipeline.use_ocr)?;

        let chunks = pages_to_chunks(
            &pages,
            self.config.pipeline.chunk_size,
            self.config.pipeline.chunk_overlap,
        );
        if chunks.is_empty() {
            warn!(object_key = key.raw, "No text chunks derived");
            return Ok(0);
        }
        info!(object_key = key.raw, chunks = chunks.len(), "Chunked document");

        let embedded = self.embed_chunks(&chunks).await;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for (chunk, embedding) in chunks.iter().zip(embedded.iter()) {
            match embedding {
                ChunkEmbedding::Embedded(vector) => rows.push(ChunkRow {
                    page_number: chunk.page_number,
                    chunk_index: chunk.chunk_index,
                    embedding: vector.clone(),
                    chunk_text: chunk.text.clone(),
                }),
                ChunkEmbedding::Skipped(reason) => {
                    skipped += 1;
                    warn!(
                        object_key = key.raw,
                        page = chunk.page_number,
                        chunk = chunk.chunk_index,
                        ?reason,
                        "Chunk skipped"
                    );
                }
            }
        }

        if skipped > 0 {
            warn!(object_key = key.raw, skipped, "Chunks excluded from storage");
        }

        self.embeddings
            .insert_chunks(&key.raw, &key.symbol, key.year, &rows)
            .await
    }

    async fn embed_chunks(&self, chunks: &[PageChunk]) -> Vec<ChunkEmbedding> {
        embed_all(
            &self.embedder,
            chunks,
            self.config.model.embed_dimensions,
            self.config.pipeline.embed_batch_size,
        )
        .await
    }

    /// Hand the document to the extraction worker over a fresh channel.
    /// Publish failure is logged but does not roll back stored embeddings.
    async fn fan_out(&self, raw_key: &str) {
        let task = ExtractionTask {
            object_key: raw_key.to_string(),
        };
        let payload = match serde_json::to_vec(&task) {
            Ok(p) => p,
            Err(e) => {
                warn!(object_key = raw_key, error = %e, "Extraction task serialization failed");
                return;
            }
        };

        let published = with_retry(RetryPolicy::default(), "extraction-publish", || async {
            let broker = Broker::connect(&self.config.broker).await?;
            let channel = broker.channel().await?;
            declare_durable(&channel, EXTRACTION_QUEUE).await?;
            publish_persistent(&channel, EXTRACTION_QUEUE, &payload).await
        })
        .await;

        match published {
            Ok(()) => info!(object_key = raw_key, "Queued for extraction"),
            Err(e) => warn!(
                object_key = raw_key,
                error = %e,
                "Failed to queue extraction task; embeddings remain stored"
            ),
        }
    }
}

/// Batch chunks through the embedding model. A batch whose retries are
/// exhausted marks its chunks skipped rather than failing the document;
/// vectors of the wrong dimensionality are dropped, never stored.
pub async fn embed_all<E: EmbedAgent>(
    embedder: &E,
    chunks: &[PageChunk],
    expected_dim: usize,
    batch_size: usize,
) -> Vec<ChunkEmbedding> {
    let mut results: Vec<ChunkEmbedding> = chunks
        .iter()
        .map(|c| {
            if c.text.trim().is_empty() {
                ChunkEmbedding::Skipped(SkipReason::EmptyText)
            } else {
                ChunkEmbedding::Skipped(SkipReason::BatchFailed)
            }
        })
        .collect();

    let valid: Vec<usize> = chunks
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.text.trim().is_empty())
        .map(|(i, _)| i)
        .collect();

    for batch_indices in valid.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch_indices
            .iter()
            .map(|&i| chunks[i].text.clone())
            .collect();

        let vectors = with_retry(RetryPolicy::default(), "embed-batch", || {
            let texts = texts.clone();
            async move { embedder.embed_batch(texts).await }
        })
        .await;

        match vectors {
            Ok(vectors) => {
                for (&i, vector) in batch_indices.iter().zip(vectors.into_iter()) {
                    if vector.len() == expected_dim {
                        results[i] = ChunkEmbedding::Embedded(vector);
                    } else {
                        results[i] =
                            ChunkEmbedding::Skipped(SkipReason::DimensionMismatch(vector.len()));
                    }
                }
            }
            Err(e) => {
                warn!(batch = batch_indices.len(), error = %e, "Embedding batch exhausted retries");
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;

    /// Stub model: three-dimensional vectors, except texts containing
    /// "short" (wrong dimension) and "fail" (batch error).
    struct StubEmbedder;

    #[async_trait]
    impl EmbedAgent for StubEmbedder {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.embed_batch(vec![text.to_string()])
                .await
                .map(|mut v| v.remove(0))
        }

        async fn embed_batch(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
            if texts.iter().any(|t| t.contains("fail")) {
                return Err(anyhow!("model unavailable"));
            }
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("short") {
                        vec![1.0]
                    } else {
                        vec![1.0, 2.0, 3.0]
                    }
                })
                .collect())
        }
    }

    fn chunk(text: &str) -> PageChunk {
        PageChunk {
            page_number: 1,
            chunk_index: 0,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn good_vectors_are_embedded() {
        let chunks = vec![chunk("alpha"), chunk("beta")];
        let results = embed_all(&StubEmbedder, &chunks, 3, 32).await;
        assert!(results
            .iter()
            .all(|r| matches!(r, ChunkEmbedding::Embedded(v) if v.len() == 3)));
    }

    #[tokio::test]
    async fn wrong_dimension_is_dropped_not_stored() {
        let chunks = vec![chunk("alpha"), chunk("short one")];
        let results = embed_all(&StubEmbedder, &chunks, 3, 32).await;
        assert!(matches!(results[0], ChunkEmbedding::Embedded(_)));
        assert!(matches!(
            results[1],
            ChunkEmbedding::Skipped(SkipReason::DimensionMismatch(1))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_batch_marks_chunks_skipped() {
        // Batch size 1 isolates the failing chunk from the good one.
        let chunks = vec![chunk("good"), chunk("fail here")];
        let results = embed_all(&StubEmbedder, &chunks, 3, 1).await;
        assert!(matches!(results[0], ChunkEmbedding::Embedded(_)));
        assert!(matches!(
            results[1],
            ChunkEmbedding::Skipped(SkipReason::BatchFailed)
        ));
    }

    #[tokio::test]
    async fn empty_chunks_never_reach_the_model() {
        let chunks = vec![chunk("   "), chunk("real text")];
        let results = embed_all(&StubEmbedder, &chunks, 3, 32).await;
        assert!(matches!(
            results[0],
            ChunkEmbedding::Skipped(SkipReason::EmptyText)
        ));
        assert!(matches!(results[1], ChunkEmbedding::Embedded(_)));
    }

    #[tokio::test]
    async fn all_empty_input_writes_nothing() {
        let chunks = vec![chunk(""), chunk("  ")];
        let results = embed_all(&StubEmbedder, &chunks, 3, 32).await;
        assert!(results
            .iter()
            .all(|r| matches!(r, ChunkEmbedding::Skipped(SkipReason::EmptyText))));
    }
}
