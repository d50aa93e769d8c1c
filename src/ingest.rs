//! Ingestion pipeline.
//!
//! CSV source → row documents → overlapping chunks → embeddings → one
//! transactional append to the store. Every run appends; nothing is
//! deduplicated against earlier runs.

use anyhow::Result;
use serde::Serialize;
use std::time::Instant;

use crate::connector_csv;
use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows read from the source file.
    pub documents: usize,
    /// Chunk records written to the store.
    pub chunks: usize,
}

pub async fn run_store(pipeline: &Pipeline) -> Result<IngestReport> {
    let started = Instant::now();
    let source = &pipeline.config().source;

    let documents = connector_csv::load_csv(source)?;
    tracing::debug!(path = %source.path.display(), rows = documents.len(), "loaded source");

    let splitter = pipeline.splitter();
    let chunks = splitter.split_documents(&documents);
    tracing::debug!(
        chunks = chunks.len(),
        chunk_size = splitter.chunk_size(),
        chunk_overlap = splitter.chunk_overlap(),
        "split documents"
    );

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = pipeline.embedder().embed_documents(&texts).await?;

    let ids = pipeline.store().add_chunks(&chunks, &vectors).await?;

    tracing::info!(
        path = %source.path.display(),
        documents = documents.len(),
        chunks = ids.len(),
        model = pipeline.embedder().model_name(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "ingestion complete"
    );

    Ok(IngestReport {
        documents: documents.len(),
        chunks: ids.len(),
    })
}
