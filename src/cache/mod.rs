//! Key/value store used for upstream response caching and the metrics snapshot.
//!
//! The [`CacheStore`] trait abstracts over where values live so the client
//! and the metrics aggregator never depend on a concrete backend:
//!
//! - [`MemoryCache`]: process-local, backed by a `DashMap`.
//! - [`SqliteCache`]: shared through the `cache_entries` table, so the
//!   server and one-off CLI runs see the same cache and snapshot.
//!
//! Expiry is TTL-only. An expired entry is dropped when it is read, and
//! [`CacheStore::purge_expired`] sweeps the rest; the metrics loop calls it
//! on every tick. There is no size bound and no eviction policy.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the live value for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// `ttl = None` keeps the value until it is overwritten.
    async fn put(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<()>;

    /// Removes every expired entry and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64>;
}

/// Builds the backend selected by `[cache].backend`.
pub fn from_config(config: &Config, pool: &sqlx::SqlitePool) -> Result<Arc<dyn CacheStore>> {
    match config.cache.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryCache::new())),
        "sqlite" => Ok(Arc::new(SqliteCache::new(pool.clone()))),
        other => anyhow::bail!("Unknown cache backend: {}", other),
    }
}
