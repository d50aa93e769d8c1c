//! Postgres + pgvector [`VectorStore`].
//!
//! Chunk records live in one table with the columns `id` (uuid, assigned by
//! Postgres), `text`, `metadata` (jsonb) and `vector`. Similarity search uses
//! the pgvector `<=>` operator, which is cosine distance.

use anyhow::{Context, Result};
use async_trait::async_trait;
use pgvector::Vector;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{ensure_aligned, VectorStore};
use crate::models::{Chunk, StoredChunk};

pub struct PgVectorStore {
    pool: PgPool,
    table: String,
}

impl PgVectorStore {
    /// Wrap a shared pool. `table` is the unquoted table name.
    pub fn new(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            table: quote_ident(table),
        }
    }
}

/// Quotes a Postgres identifier, escaping embedded quotes.
pub fn quote_ident(input: &str) -> String {
    format!("\"{}\"", input.replace('"', "\"\""))
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn add_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<Vec<Uuid>> {
        ensure_aligned(chunks, vectors)?;

        let sql = format!(
            "INSERT INTO {} (text, metadata, vector) VALUES ($1, $2, $3) RETURNING id",
            self.table
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open a transaction on the chunk store")?;

        let mut ids = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.iter().zip(vectors) {
            let id: Uuid = sqlx::query_scalar(&sql)
                .bind(&chunk.text)
                .bind(Json(&chunk.metadata))
                .bind(Vector::from(vector.clone()))
                .fetch_one(&mut *tx)
                .await
                .context("Failed to insert chunk record")?;
            ids.push(id);
        }

        tx.commit()
            .await
            .context("Failed to commit chunk records")?;
        Ok(ids)
    }

    async fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<StoredChunk>> {
        let sql = format!(
            "SELECT id, text, metadata, vector <=> $1 AS distance \
             FROM {} \
             ORDER BY distance ASC \
             LIMIT $2",
            self.table
        );

        let rows = sqlx::query(&sql)
            .bind(Vector::from(query.to_vec()))
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await
            .context("Similarity search failed")?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let metadata: Option<Json<Value>> = row.try_get("metadata")?;
            let text: Option<String> = row.try_get("text")?;
            hits.push(StoredChunk {
                id: row.try_get("id")?,
                text: text.unwrap_or_default(),
                metadata: metadata.map(|m| m.0).unwrap_or(Value::Null),
                distance: row.try_get("distance")?,
            });
        }

        Ok(hits)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
