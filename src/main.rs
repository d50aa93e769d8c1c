//! # pgrag CLI
//!
//! Runs the HTTP service by default and exposes the two pipeline flows as
//! one-shot commands for scripting and debugging.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pgrag` / `pgrag serve` | Start the HTTP server |
//! | `pgrag init` | Create the pgvector extension and chunk table |
//! | `pgrag store` | Ingest the configured CSV file once |
//! | `pgrag ask "<question>"` | Answer a question from stored chunks |
//!
//! ## Environment
//!
//! `DATABASE_URL` and `OPENAI_API_KEY` are required. `PORT` (default 3001),
//! `HOST` (default 0.0.0.0), `APP_ENV`, and `PGRAG_CONFIG` are optional.
//! Every variable can also be given as a flag.
//!
//! Before parsing, `.env.local` and then `.env` are read from the working
//! directory (or the nearest parent that has them). Variables already set
//! in the process environment win, and `.env.local` wins over `.env`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use pgrag::config::{self, RuntimeEnv};
use pgrag::pipeline::Pipeline;
use pgrag::{db, ingest, logging, migrate, retrieve, server};

#[derive(Parser)]
#[command(
    name = "pgrag",
    about = "Retrieval-augmented question answering over a CSV file stored in pgvector",
    version
)]
struct Cli {
    /// Runtime environment. `production` switches logs to JSON.
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = RuntimeEnv::Development)]
    env: RuntimeEnv,

    /// Port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Interface the HTTP server binds.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// PostgreSQL connection string. The database needs the pgvector extension.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// OpenAI API key, used for both embeddings and chat.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// Optional TOML file with pipeline settings (source, chunking, models).
    #[arg(long, env = "PGRAG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default).
    Serve,

    /// Create the pgvector extension and the chunk table.
    ///
    /// Idempotent. `serve`, `store`, and `ask` run the same setup on start.
    Init,

    /// Ingest the configured CSV file once and print a summary.
    Store,

    /// Answer a question from stored chunks and print the answer.
    Ask {
        /// The question to answer.
        question: String,
    },
}

/// Load dotenv files without overriding variables that are already set.
fn load_env_files() -> anyhow::Result<()> {
    for name in [".env.local", ".env"] {
        match dotenvy::from_filename(name) {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).with_context(|| format!("Failed to load {}", name)),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_files()?;
    let cli = Cli::parse();

    logging::init_logging(cli.env)?;

    let cfg = config::load_config(cli.config.as_deref())?;
    tracing::debug!(env = %cli.env, table = %cfg.store.table, "configuration loaded");

    let pool = db::connect(&cli.database_url, &cfg.store).await?;
    migrate::run_migrations(&pool, &cfg).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Init => {
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            let pipeline = Arc::new(Pipeline::openai(cfg, pool, &cli.openai_api_key)?);
            let bind = format!("{}:{}", cli.host, cli.port);
            server::run_server(&bind, pipeline).await?;
        }
        Commands::Store => {
            let pipeline = Pipeline::openai(cfg, pool, &cli.openai_api_key)?;
            let report = ingest::run_store(&pipeline).await?;
            println!(
                "Stored {} chunks from {} rows.",
                report.chunks, report.documents
            );
        }
        Commands::Ask { question } => {
            let pipeline = Pipeline::openai(cfg, pool, &cli.openai_api_key)?;
            let answer = retrieve::answer_question(&pipeline, &question)
                .await
                .context("failed to answer question")?;
            println!("{}", answer.answer);
        }
    }

    Ok(())
}
