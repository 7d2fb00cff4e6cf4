//! Usage metrics aggregated from `query_logs`.
//!
//! A [`MetricsSnapshot`] is recomputed from scratch on every run and
//! written over the single `metrics:latest` key of the [`CacheStore`];
//! earlier snapshots are never merged or kept. The server recomputes on a
//! fixed interval ([`spawn_recompute_loop`]) and once on demand when a
//! read finds no snapshot ([`MetricsService::latest`]).
//!
//! Top queries are ordered by count only. Pairs with equal counts come
//! back in whatever order SQLite groups them, so the fifth slot can vary
//! between runs when several pairs tie.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cache::CacheStore;
use crate::query_log::round2;

pub const SNAPSHOT_KEY: &str = "metrics:latest";
const TOP_QUERY_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub top_queries: Vec<TopQuery>,
    pub average_duration_ms: f64,
    pub cache_stats: CacheStats,
    pub status_stats: StatusStats,
    pub total_queries: i64,
    /// RFC 3339 completion time.
    pub computed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopQuery {
    /// `"<type>:<query>"`, e.g. `"films:hope"`.
    pub query: String,
    pub search_type: String,
    pub search_query: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub cached: i64,
    pub non_cached: i64,
    pub cached_percentage: f64,
    pub non_cached_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusStats {
    pub success: i64,
    pub error: i64,
    pub success_percentage: f64,
    pub error_percentage: f64,
}

/// Share of `part` in `total`, as a percentage rounded to two decimals. 0 when `total` is 0.
fn percentage(part: i64, total: i64) -> f64 {
    if total > 0 {
        round2(part as f64 / total as f64 * 100.0)
    } else {
        0.0
    }
}

/// Computes a fresh snapshot over every logged query.
pub async fn compute_snapshot(pool: &SqlitePool) -> Result<MetricsSnapshot> {
    let totals = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            AVG(duration_ms) AS avg_duration,
            COALESCE(SUM(CASE WHEN cached THEN 1 ELSE 0 END), 0) AS cached,
            COALESCE(SUM(CASE WHEN is_error THEN 1 ELSE 0 END), 0) AS errors
        FROM query_logs
        "#,
    )
    .fetch_one(pool)
    .await?;

    let total: i64 = totals.get("total");
    let avg_duration: Option<f64> = totals.get("avg_duration");
    let cached: i64 = totals.get("cached");
    let errors: i64 = totals.get("errors");

    let top_rows = sqlx::query(
        r#"
        SELECT search_type, search_query, COUNT(*) AS count
        FROM query_logs
        GROUP BY search_type, search_query
        ORDER BY count DESC
        LIMIT ?
        "#,
    )
    .bind(TOP_QUERY_LIMIT)
    .fetch_all(pool)
    .await?;

    let top_queries = top_rows
        .iter()
        .map(|row| {
            let search_type: String = row.get("search_type");
            let search_query: String = row.get("search_query");
            let count: i64 = row.get("count");
            TopQuery {
                query: format!("{}:{}", search_type, search_query),
                search_type,
                search_query,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    let non_cached = total - cached;
    let success = total - errors;

    Ok(MetricsSnapshot {
        top_queries,
        average_duration_ms: round2(avg_duration.unwrap_or(0.0)),
        cache_stats: CacheStats {
            cached,
            non_cached,
            cached_percentage: percentage(cached, total),
            non_cached_percentage: percentage(non_cached, total),
        },
        status_stats: StatusStats {
            success,
            error: errors,
            success_percentage: percentage(success, total),
            error_percentage: percentage(errors, total),
        },
        total_queries: total,
        computed_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Recomputes and serves the stored snapshot.
pub struct MetricsService {
    pool: SqlitePool,
    store: Arc<dyn CacheStore>,
}

impl MetricsService {
    pub fn new(pool: SqlitePool, store: Arc<dyn CacheStore>) -> Self {
        Self { pool, store }
    }

    /// Computes a snapshot and replaces the stored one.
    pub async fn recompute(&self) -> Result<MetricsSnapshot> {
        let snapshot = compute_snapshot(&self.pool).await?;
        self.store
            .put(SNAPSHOT_KEY, &serde_json::to_value(&snapshot)?, None)
            .await?;
        Ok(snapshot)
    }

    /// The stored snapshot, verbatim. Computes one first if none exists yet.
    pub async fn latest(&self) -> Result<Value> {
        if let Some(stored) = self.store.get(SNAPSHOT_KEY).await? {
            return Ok(stored);
        }

        info!("no metrics snapshot stored, computing one");
        let snapshot = self.recompute().await?;
        Ok(serde_json::to_value(snapshot)?)
    }
}

/// Recomputes the snapshot every `interval` until the task is aborted.
///
/// Each tick also purges expired entries from the store. The first run
/// happens immediately. A failed run is logged and the loop continues with
/// the next tick.
pub fn spawn_recompute_loop(service: Arc<MetricsService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            info!("recomputing metrics snapshot");
            match service.recompute().await {
                Ok(snapshot) => info!(
                    total_queries = snapshot.total_queries,
                    "metrics snapshot recomputed"
                ),
                Err(e) => error!(error = %e, "failed to recompute metrics"),
            }
            match service.store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "expired cache entries purged"),
                Err(e) => warn!(error = %e, "failed to purge expired cache entries"),
            }
        }
    })
}
