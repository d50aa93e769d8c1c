//! Core data models used throughout the pipeline.
//!
//! These types represent the loaded rows, the chunks cut from them, and the
//! stored chunk records that come back from similarity search.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// One source row after loading, before splitting.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub page_content: String,
    /// JSON object, e.g. `{"source": "data/books.csv", "line": 3}`.
    pub metadata: Value,
}

/// A window of a document's text, ready to be embedded and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub metadata: Value,
}

/// A chunk record read back from the store by a similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct StoredChunk {
    pub id: Uuid,
    pub text: String,
    pub metadata: Value,
    /// Cosine distance to the query vector (`0.0` = same direction).
    pub distance: f64,
}
