//! Embedding provider abstraction and the OpenAI implementation.
//!
//! Defines the [`Embedder`] trait the pipeline talks to, plus
//! [`OpenAIEmbedder`], which calls the OpenAI embeddings API in batches of
//! `embedding.batch_size` inputs. Retry and backoff are shared with the chat
//! client (see [`crate::openai`]).

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::openai;

/// Something that turns text into fixed-dimension vectors.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// request handler.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-large"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `3072`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts, returning one vector per input in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_documents(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }
}

/// Embedding provider using the OpenAI API (`POST {base_url}/embeddings`).
pub struct OpenAIEmbedder {
    config: EmbeddingConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIEmbedder {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("OpenAI API key must not be empty");
        }

        let client = openai::build_client(config.timeout_secs)?;

        Ok(Self {
            config: config.clone(),
            api_key: api_key.trim().to_string(),
            client,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = openai::endpoint(&self.config.base_url, "embeddings");
        let body = serde_json::json!({
            "model": self.config.model,
            "input": texts,
            "dimensions": self.config.dims,
        });

        let json = openai::post_json_with_retry(
            &self.client,
            &url,
            &self.api_key,
            &body,
            self.config.max_retries,
        )
        .await?;

        let vectors = parse_openai_response(&json)?;
        self.check_shape(texts.len(), vectors)
    }

    fn check_shape(&self, expected: usize, vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
        if vectors.len() != expected {
            bail!(
                "OpenAI returned {} embeddings for {} inputs",
                vectors.len(),
                expected
            );
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.config.dims) {
            bail!(
                "OpenAI returned a {}-dimensional embedding, expected {}",
                bad.len(),
                self.config.dims
            );
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn dims(&self) -> usize {
        self.config.dims
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        Ok(vectors)
    }
}

/// Parse the OpenAI embeddings API response JSON.
///
/// Extracts the `data[].embedding` arrays and orders them by `data[].index`
/// so the output lines up with the request's `input` array.
pub fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());

    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing embedding"))?;

        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        indexed.push((index, vec));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response_in_input_order() {
        let body = json!({
            "object": "list",
            "data": [
                { "object": "embedding", "index": 1, "embedding": [0.5, 0.5] },
                { "object": "embedding", "index": 0, "embedding": [1.0, 0.0] }
            ],
            "model": "text-embedding-3-large"
        });
        let vectors = parse_openai_response(&body).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.5, 0.5]]);
    }

    #[test]
    fn test_parse_response_without_index_keeps_position() {
        let body = json!({ "data": [ { "embedding": [1.0] }, { "embedding": [2.0] } ] });
        let vectors = parse_openai_response(&body).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_parse_response_missing_data() {
        let err = parse_openai_response(&json!({ "error": "nope" })).unwrap_err();
        assert!(err.to_string().contains("missing data array"));
    }

    #[test]
    fn test_parse_response_missing_embedding() {
        let err = parse_openai_response(&json!({ "data": [ { "index": 0 } ] })).unwrap_err();
        assert!(err.to_string().contains("missing embedding"));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(OpenAIEmbedder::new(&EmbeddingConfig::default(), "  ").is_err());
    }

    #[test]
    fn test_shape_check() {
        let config = EmbeddingConfig {
            dims: 2,
            ..EmbeddingConfig::default()
        };
        let embedder = OpenAIEmbedder::new(&config, "sk-test").unwrap();
        assert!(embedder.check_shape(1, vec![vec![1.0, 0.0]]).is_ok());
        assert!(embedder.check_shape(2, vec![vec![1.0, 0.0]]).is_err());
        assert!(embedder.check_shape(1, vec![vec![1.0]]).is_err());
    }
}
