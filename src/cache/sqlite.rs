//! SQLite-backed [`CacheStore`] implementation over the `cache_entries` table.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use std::time::Duration;

use super::CacheStore;

/// Cache shared by every process that opens the same database file.
///
/// Writes are single `INSERT .. ON CONFLICT` statements, so a reader sees
/// either the old value or the new one, never a mix.
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl CacheStore for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value, expires_at FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let expires_at: Option<i64> = row.get("expires_at");
        if expires_at.is_some_and(|at| at <= now_millis()) {
            sqlx::query("DELETE FROM cache_entries WHERE key = ? AND expires_at <= ?")
                .bind(key)
                .bind(now_millis())
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        let raw: String = row.get("value");
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn put(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|ttl| now_millis() + ttl.as_millis() as i64);

        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(serde_json::to_string(value)?)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= ?")
                .bind(now_millis())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
