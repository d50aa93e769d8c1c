//! Process-wide pipeline state.
//!
//! A [`Pipeline`] bundles everything both request handlers share: the
//! configuration, the vector store (and through it the connection pool), the
//! embedder, the chat model, the prompt template, and the text splitter. It
//! is built once at startup, wrapped in an `Arc`, and never mutated.

use anyhow::{bail, Result};
use sqlx::PgPool;
use std::sync::Arc;

use crate::chat::{ChatModel, OpenAIChat};
use crate::chunk::TextSplitter;
use crate::config::Config;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::prompt::PromptTemplate;
use crate::store::{PgVectorStore, VectorStore};

pub struct Pipeline {
    config: Config,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    splitter: TextSplitter,
}

impl Pipeline {
    /// Assemble a pipeline from explicit components.
    ///
    /// Loads the prompt template named by `config.prompt.template_path`, or
    /// the built-in one. The embedder must produce vectors of
    /// `embedding.dims`, the width of the store's vector column.
    pub fn new(
        config: Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        if embedder.dims() != config.embedding.dims {
            bail!(
                "embedder {} produces {}-dimensional vectors but embedding.dims is {}",
                embedder.model_name(),
                embedder.dims(),
                config.embedding.dims
            );
        }

        let prompt = PromptTemplate::load(config.prompt.template_path.as_deref())?;
        let splitter = TextSplitter::from_config(&config.chunking);

        Ok(Self {
            config,
            store,
            embedder,
            chat,
            prompt,
            splitter,
        })
    }

    /// The production wiring: pgvector on `pool`, OpenAI for embeddings and chat.
    pub fn openai(config: Config, pool: PgPool, api_key: &str) -> Result<Self> {
        let store = Arc::new(PgVectorStore::new(pool, &config.store.table));
        let embedder = Arc::new(OpenAIEmbedder::new(&config.embedding, api_key)?);
        let chat = Arc::new(OpenAIChat::new(&config.chat, api_key)?);
        Self::new(config, store, embedder, chat)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn chat(&self) -> &dyn ChatModel {
        self.chat.as_ref()
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    pub fn splitter(&self) -> &TextSplitter {
        &self.splitter
    }
}
