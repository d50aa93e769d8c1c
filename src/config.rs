//! Pipeline configuration.
//!
//! Process-level settings (port, database URL, API key) come from the CLI
//! and environment; everything that shapes the pipeline itself lives here
//! and is read once from an optional TOML file. Every key has a default, so
//! an absent file yields the stock pipeline.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Deployment environment the process runs in. Selects the log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RuntimeEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl fmt::Display for RuntimeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeEnv::Development => "development",
            RuntimeEnv::Production => "production",
            RuntimeEnv::Test => "test",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
    /// Use a single column as page content instead of `key: value` lines.
    #[serde(default)]
    pub column: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
            column: None,
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from("data/books.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_table() -> String {
    "file_embedding_chunks".to_string()
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dims: default_dims(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-large".to_string()
}
fn default_dims() -> usize {
    3072
}
fn default_batch_size() -> usize {
    512
}
fn default_max_retries() -> u32 {
    5
}
fn default_embedding_timeout_secs() -> u64 {
    30
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            temperature: 0.0,
            max_retries: default_max_retries(),
            timeout_secs: default_chat_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_chat_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PromptConfig {
    /// Handlebars template replacing the built-in RAG prompt.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

/// Load the pipeline config from `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            parse_config(&content)?
        }
        None => Config::default(),
    };

    validate(&config)?;
    Ok(config)
}

/// Parse a TOML document into a [`Config`] without validating it.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap,
            config.chunking.chunk_size
        );
    }

    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    if config.store.table.trim().is_empty() {
        anyhow::bail!("store.table must not be empty");
    }
    if config.store.max_connections == 0 {
        anyhow::bail!("store.max_connections must be > 0");
    }

    if !(0.0..=2.0).contains(&config.chat.temperature) {
        anyhow::bail!("chat.temperature must be in [0.0, 2.0]");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_pipeline() {
        let config = load_config(None).unwrap();
        assert_eq!(config.source.path, PathBuf::from("data/books.csv"));
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.store.table, "file_embedding_chunks");
        assert_eq!(config.embedding.model, "text-embedding-3-large");
        assert_eq!(config.embedding.dims, 3072);
        assert_eq!(config.chat.model, "gpt-4o-mini");
        assert_eq!(config.chat.temperature, 0.0);
        assert_eq!(config.retrieval.top_k, 4);
        assert!(config.prompt.template_path.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = parse_config(
            r#"
[source]
path = "fixtures/two.csv"

[retrieval]
top_k = 1
"#,
        )
        .unwrap();
        validate(&config).unwrap();
        assert_eq!(config.source.path, PathBuf::from("fixtures/two.csv"));
        assert_eq!(config.retrieval.top_k, 1);
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.embedding.batch_size, 512);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let config = parse_config("[chunking]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let config = parse_config("[retrieval]\ntop_k = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_temperature_range() {
        let config = parse_config("[chat]\ntemperature = 3.5\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = parse_config(include_str!("../config/pgrag.example.toml")).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.store.table, "file_embedding_chunks");
        assert_eq!(config.embedding.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/pgrag.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
