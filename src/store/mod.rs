//! Vector storage abstraction.
//!
//! The [`VectorStore`] trait covers everything the two pipelines need from
//! persistence: append embedded chunks, and find the chunks nearest to a
//! query vector under cosine distance.
//!
//! | Implementation | Backing |
//! |----------------|---------|
//! | [`PgVectorStore`] | Postgres + pgvector, via a shared `sqlx` pool |
//! | [`InMemoryStore`] | brute-force scan over a `Vec`, for tests and local runs |

pub mod memory;
pub mod pg;

pub use memory::InMemoryStore;
pub use pg::PgVectorStore;

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Chunk, StoredChunk};

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append chunk records, one per `(chunk, vector)` pair.
    ///
    /// All records become visible together or not at all. Returns the
    /// identifiers the store assigned, in input order.
    async fn add_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<Vec<Uuid>>;

    /// Return up to `k` chunks ordered by ascending cosine distance to `query`.
    async fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<StoredChunk>>;

    /// Number of chunk records currently stored.
    async fn count(&self) -> Result<i64>;
}

fn ensure_aligned(chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
    if chunks.len() != vectors.len() {
        bail!(
            "cannot store {} chunks with {} vectors",
            chunks.len(),
            vectors.len()
        );
    }
    Ok(())
}
