use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::StoreConfig;

/// Open the process-wide connection pool.
///
/// Connects eagerly so a bad `DATABASE_URL` fails startup rather than the
/// first request.
pub async fn connect(database_url: &str, config: &StoreConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to the database")?;

    Ok(pool)
}
