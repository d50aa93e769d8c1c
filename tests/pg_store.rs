//! Round-trip tests against a real Postgres with pgvector.
//!
//! Skipped unless `PGRAG_TEST_DATABASE_URL` is set. Each test works in its
//! own table and drops it afterwards.

use pgrag::config::{parse_config, Config};
use pgrag::db;
use pgrag::migrate::run_migrations;
use pgrag::models::Chunk;
use pgrag::store::{PgVectorStore, VectorStore};
use serde_json::json;

fn database_url() -> Option<String> {
    match std::env::var("PGRAG_TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => Some(url),
        _ => {
            eprintln!("PGRAG_TEST_DATABASE_URL not set, skipping");
            None
        }
    }
}

fn test_config() -> Config {
    let table = format!("pgrag_test_{}", uuid::Uuid::new_v4().simple());
    parse_config(&format!(
        "[store]\ntable = \"{}\"\n\n[embedding]\ndims = 3\n",
        table
    ))
    .unwrap()
}

fn chunk(text: &str, line: u64) -> Chunk {
    Chunk {
        text: text.to_string(),
        metadata: json!({ "source": "books.csv", "line": line }),
    }
}

#[tokio::test]
async fn test_pgvector_insert_and_search() {
    let Some(url) = database_url() else { return };
    let cfg = test_config();
    let pool = db::connect(&url, &cfg.store).await.unwrap();

    run_migrations(&pool, &cfg).await.unwrap();
    // Second run is a no-op.
    run_migrations(&pool, &cfg).await.unwrap();

    let store = PgVectorStore::new(pool.clone(), &cfg.store.table);
    let ids = store
        .add_chunks(
            &[chunk("north", 1), chunk("east", 2), chunk("north-east", 3)],
            &[
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.7, 0.7, 0.0],
            ],
        )
        .await
        .unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(store.count().await.unwrap(), 3);

    let hits = store.similarity_search(&[1.0, 0.1, 0.0], 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "north");
    assert_eq!(hits[1].text, "north-east");
    assert!(hits[0].distance <= hits[1].distance);
    assert_eq!(hits[0].metadata["line"], 1);
    assert_eq!(hits[0].id, ids[0]);

    sqlx::query(&format!("DROP TABLE {}", pgrag::store::pg::quote_ident(&cfg.store.table)))
        .execute(&pool)
        .await
        .unwrap();
}

/// A failing insert leaves none of the batch behind.
#[tokio::test]
async fn test_pgvector_batch_is_atomic() {
    let Some(url) = database_url() else { return };
    let cfg = test_config();
    let pool = db::connect(&url, &cfg.store).await.unwrap();
    run_migrations(&pool, &cfg).await.unwrap();

    let store = PgVectorStore::new(pool.clone(), &cfg.store.table);
    // Second vector has the wrong dimension for the column.
    let result = store
        .add_chunks(
            &[chunk("ok", 1), chunk("bad", 2)],
            &[vec![1.0, 0.0, 0.0], vec![1.0, 0.0]],
        )
        .await;

    assert!(result.is_err());
    assert_eq!(store.count().await.unwrap(), 0);

    sqlx::query(&format!("DROP TABLE {}", pgrag::store::pg::quote_ident(&cfg.store.table)))
        .execute(&pool)
        .await
        .unwrap();
}
