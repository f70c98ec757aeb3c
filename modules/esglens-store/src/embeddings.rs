use pgvector::Vector;
use sqlx::PgPool;
use tracing::info;

use esglens_common::EsgError;

#[derive(Clone)]
pub struct EmbeddingStore {
    pool: PgPool,
}

/// One chunk ready for storage: position within the document plus its vector.
#[derive(Debug, Clone)]
pub struct ChunkRow {
    pub page_number: i32,
    pub chunk_index: i32,
    pub embedding: Vec<f32>,
    pub chunk_text: String,
}

/// Row returned from filtered nearest-neighbor search, ascending distance.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RetrievedChunk {
    pub page_number: i32,
    pub chunk_index: i32,
    pub chunk_text: String,
    pub distance: f64,
}

impl EmbeddingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotency gate for the embeddings worker.
    pub async fn exists_for_key(&self, object_key: &str) -> Result<bool, EsgError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM document_embeddings WHERE object_key = $1",
        )
        .bind(object_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Bulk-insert chunks for one document in a single transaction.
    pub async fn insert_chunks(
        &self,
        object_key: &str,
        company_name: &str,
        report_year: i32,
        chunks: &[ChunkRow],
    ) -> Result<usize, EsgError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO document_embeddings
                    (object_key, company_name, report_year, page_number, chunk_index, embedding, chunk_text)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(object_key)
            .bind(company_name)
            .bind(report_year)
            .bind(chunk.page_number)
            .bind(chunk.chunk_index)
            .bind(Vector::from(chunk.embedding.clone()))
            .bind(&chunk.chunk_text)
            .execute(&mut *tx)
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| EsgError::Database(e.to_string()))?;

        info!(object_key, stored = chunks.len(), "Stored embeddings");
        Ok(chunks.len())
    }

    /// k-nearest-neighbor search restricted to one (company, year) document
    /// set, ordered by ascending cosine distance.
    pub async fn search_filtered(
        &self,
        query: Vec<f32>,
        company_name: &str,
        report_year: i32,
        k: i64,
    ) -> Result<Vec<RetrievedChunk>, EsgError> {
        sqlx::query_as::<_, RetrievedChunk>(
            r#"
            SELECT page_number, chunk_index, chunk_text,
                   (embedding <=> $1)::float8 AS distance
            FROM document_embeddings
            WHERE company_name = $2 AND report_year = $3
            ORDER BY embedding <=> $1
            LIMIT $4
            "#,
        )
        .bind(Vector::from(query))
        .bind(company_name)
        .bind(report_year)
        .bind(k)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))
    }
}
