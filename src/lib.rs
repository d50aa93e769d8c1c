//! # pgrag
//!
//! A small retrieval-augmented-generation service over PostgreSQL + pgvector.
//!
//! One endpoint ingests a CSV file (row documents, overlapping chunks,
//! OpenAI embeddings, pgvector rows); the other answers a question by
//! embedding it, pulling the nearest chunks, and asking a chat model to
//! answer from them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────┐
//! │   CSV    │──▶│ Split+Embed  │──▶│  Postgres  │
//! │  source  │   │  (OpenAI)    │   │  pgvector  │
//! └──────────┘   └──────────────┘   └─────┬──────┘
//!                                         │ top-k cosine
//!                                         ▼
//!                ┌──────────────┐   ┌────────────┐
//!  question ────▶│   Prompt     │──▶│    Chat    │──▶ answer
//!                │ (handlebars) │   │  (OpenAI)  │
//!                └──────────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export DATABASE_URL=postgres://localhost/rag OPENAI_API_KEY=sk-...
//! pgrag init                      # create extension + table
//! pgrag serve                     # GET /store, POST /retrieve on :3001
//! pgrag store                     # ingest from the CLI instead
//! pgrag ask "Who wrote Dune?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML pipeline configuration |
//! | [`models`] | Document, chunk, and search hit types |
//! | [`connector_csv`] | CSV rows to documents |
//! | [`chunk`] | Recursive character text splitting |
//! | [`openai`] | Shared HTTP client and retry loop |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`chat`] | Chat model abstraction |
//! | [`prompt`] | RAG prompt template |
//! | [`store`] | Vector store trait, pgvector and in-memory backends |
//! | [`db`] | Connection pool |
//! | [`migrate`] | Schema setup |
//! | [`pipeline`] | Shared process state |
//! | [`ingest`] | Store flow |
//! | [`retrieve`] | Retrieve-then-generate flow |
//! | [`server`] | HTTP server |
//! | [`logging`] | Tracing subscriber setup |

pub mod chat;
pub mod chunk;
pub mod config;
pub mod connector_csv;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod retrieve;
pub mod server;
pub mod store;
