//! In-memory [`VectorStore`] implementation for testing and local runs.
//!
//! Records live in a `Vec` behind a `std::sync::RwLock`. Similarity search is
//! a brute-force cosine distance scan over every stored vector.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{ensure_aligned, VectorStore};
use crate::models::{Chunk, StoredChunk};

struct Record {
    id: Uuid,
    text: String,
    metadata: Value,
    vector: Vec<f32>,
}

#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns `0.0` for empty vectors, zero vectors, or vectors of different
/// lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn add_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<Vec<Uuid>> {
        ensure_aligned(chunks, vectors)?;

        let new_records: Vec<Record> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| Record {
                id: Uuid::new_v4(),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                vector: vector.clone(),
            })
            .collect();
        let ids = new_records.iter().map(|r| r.id).collect();

        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        records.extend(new_records);

        Ok(ids)
    }

    async fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<StoredChunk>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;

        let mut hits: Vec<StoredChunk> = records
            .iter()
            .map(|r| StoredChunk {
                id: r.id,
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                distance: 1.0 - cosine_similarity(query, &r.vector) as f64,
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self) -> Result<i64> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(records.len() as i64)
    }
}
