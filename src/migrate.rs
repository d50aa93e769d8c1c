use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::Config;
use crate::store::pg::quote_ident;

/// Create the pgvector extension and the chunk table if they are missing.
///
/// Idempotent; runs on every startup.
pub async fn run_migrations(pool: &PgPool, config: &Config) -> Result<()> {
    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pool)
        .await
        .context("Failed to enable the pgvector extension")?;

    sqlx::query(&chunk_table_ddl(&config.store.table, config.embedding.dims))
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create table {}", config.store.table))?;

    tracing::debug!(table = %config.store.table, dims = config.embedding.dims, "schema ready");
    Ok(())
}

fn chunk_table_ddl(table: &str, dims: usize) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            text TEXT,
            metadata JSONB,
            vector VECTOR({})
        )
        "#,
        quote_ident(table),
        dims
    )
}
