//! Search query logging.
//!
//! Every search use-case invocation appends exactly one `query_logs` row,
//! whether it succeeded or failed. [`QueryLogger::execute_and_log`] is the
//! wrapper the search use cases run their work through; detail lookups are
//! not logged.
//!
//! A failed log write is reported through `tracing` and otherwise
//! ignored: logging never fails a user-facing request.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use crate::client::CacheStatus;
use crate::error::SwapiError;
use crate::query::{SearchQuery, SearchType};

/// One row of `query_logs`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLogEntry {
    pub search_type: SearchType,
    pub search_query: String,
    pub duration_ms: f64,
    pub result_count: i64,
    pub cached: bool,
    pub is_error: bool,
    /// Stored as Unix milliseconds; finer precision is dropped.
    pub created_at: DateTime<Utc>,
}

pub struct QueryLogger {
    pool: SqlitePool,
    cache_status: Arc<dyn CacheStatus>,
}

impl QueryLogger {
    pub fn new(pool: SqlitePool, cache_status: Arc<dyn CacheStatus>) -> Self {
        Self { pool, cache_status }
    }

    pub fn was_last_request_cached(&self) -> bool {
        self.cache_status.was_last_request_cached()
    }

    /// Appends `entry`. Write failures are logged, never returned.
    pub async fn log(&self, entry: &QueryLogEntry) {
        let result = sqlx::query(
            r#"
            INSERT INTO query_logs (search_type, search_query, duration_ms, result_count,
                                    cached, is_error, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.search_type.as_str())
        .bind(&entry.search_query)
        .bind(round2(entry.duration_ms))
        .bind(entry.result_count)
        .bind(entry.cached)
        .bind(entry.is_error)
        .bind(entry.created_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            error!(
                error = %e,
                search_type = entry.search_type.as_str(),
                search_query = %entry.search_query,
                "failed to write query log"
            );
        }
    }

    /// Runs `search`, then logs its type, query, duration, result count,
    /// cache flag and error flag.
    ///
    /// The result (or error) of `search` is returned untouched.
    pub async fn execute_and_log<T, F, Fut>(
        &self,
        search_type: SearchType,
        query: &SearchQuery,
        search: F,
    ) -> Result<Vec<T>, SwapiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, SwapiError>>,
    {
        let started = Instant::now();
        let outcome = search().await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let (result_count, is_error) = match &outcome {
            Ok(results) => (results.len() as i64, false),
            Err(_) => (0, true),
        };

        self.log(&QueryLogEntry {
            search_type,
            search_query: query.as_str().to_string(),
            duration_ms,
            result_count,
            cached: self.was_last_request_cached(),
            is_error,
            created_at: Utc::now(),
        })
        .await;

        outcome
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
