use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates every table and index the service needs. Idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Append-only search log
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS query_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            search_type TEXT NOT NULL,
            search_query TEXT NOT NULL,
            duration_ms REAL NOT NULL,
            result_count INTEGER NOT NULL DEFAULT 0,
            cached INTEGER NOT NULL DEFAULT 0,
            is_error INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL -- unix millis
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Key/value store backing the upstream cache and the metrics snapshot
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cache_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            expires_at INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_query_logs_type_query ON query_logs(search_type, search_query)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_query_logs_created_at ON query_logs(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}
