//! Cached, rate-limit-aware client for the upstream Star Wars API.
//!
//! Every call goes through the same cached GET:
//!
//! 1. Key the endpoint (path + query string) as `swapi:<sha256 hex>`.
//! 2. Cache hit → return the stored JSON, mark the call as cached.
//! 3. Cache miss → `GET base_url + endpoint`, retrying transport failures
//!    up to `upstream.retries` extra times with a fixed delay.
//! 4. Map the status: `429` → [`SwapiError::RateLimitExceeded`], `404` →
//!    empty object, other failures → [`SwapiError::ExternalServiceUnavailable`].
//! 5. Store successful bodies for `upstream.cache_ttl_secs`.
//!
//! # Request scope
//!
//! A `SwapiClient` is built per incoming request around a shared
//! `reqwest::Client` and [`CacheStore`]. The "last call was cached" flag
//! therefore describes the most recent upstream call of *that* request.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::config::UpstreamConfig;
use crate::error::SwapiError;

/// Read access to whether the most recent upstream call was a cache hit.
pub trait CacheStatus: Send + Sync {
    fn was_last_request_cached(&self) -> bool;
}

/// Builds the shared HTTP client with the configured per-call timeout.
pub fn build_http_client(config: &UpstreamConfig) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(concat!("swapi-proxy/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub struct SwapiClient {
    http: reqwest::Client,
    cache: Arc<dyn CacheStore>,
    config: UpstreamConfig,
    last_request_cached: AtomicBool,
}

impl SwapiClient {
    pub fn new(http: reqwest::Client, cache: Arc<dyn CacheStore>, config: UpstreamConfig) -> Self {
        Self {
            http,
            cache,
            config,
            last_request_cached: AtomicBool::new(false),
        }
    }

    pub async fn search_people(&self, name: &str) -> Result<Value, SwapiError> {
        self.cached_get(&format!("/people/?name={}", urlencoding::encode(name)))
            .await
    }

    pub async fn search_films(&self, title: &str) -> Result<Value, SwapiError> {
        self.cached_get(&format!("/films/?title={}", urlencoding::encode(title)))
            .await
    }

    pub async fn get_person(&self, id: &str) -> Result<Value, SwapiError> {
        self.cached_get(&format!("/people/{}", id)).await
    }

    pub async fn get_film(&self, id: &str) -> Result<Value, SwapiError> {
        self.cached_get(&format!("/films/{}", id)).await
    }

    async fn cached_get(&self, endpoint: &str) -> Result<Value, SwapiError> {
        let key = cache_key(endpoint);

        // A broken cache degrades to a miss rather than failing the call.
        let cached = match self.cache.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(endpoint, error = %e, "cache read failed");
                None
            }
        };

        if let Some(value) = cached {
            self.last_request_cached.store(true, Ordering::SeqCst);
            debug!(endpoint, "upstream cache hit");
            return Ok(value);
        }

        self.last_request_cached.store(false, Ordering::SeqCst);
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        info!(%url, "upstream request");

        let response = self.send_with_retry(&url, endpoint).await?;
        let status = response.status();

        if status.as_u16() == 429 {
            warn!(endpoint, "upstream rate limit exceeded");
            return Err(SwapiError::RateLimitExceeded);
        }

        if status.as_u16() == 404 {
            info!(endpoint, "upstream resource not found");
            return Ok(Value::Object(Map::new()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(500).collect();
            error!(
                endpoint,
                status = status.as_u16(),
                body = %snippet,
                "upstream returned error status"
            );
            return Err(SwapiError::ExternalServiceUnavailable(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let data: Value = response.json().await.map_err(|e| {
            error!(endpoint, error = %e, "upstream body was not valid JSON");
            SwapiError::ExternalServiceUnavailable(e.to_string())
        })?;

        if let Err(e) = self
            .cache
            .put(&key, &data, Some(self.config.cache_ttl()))
            .await
        {
            warn!(endpoint, error = %e, "cache write failed");
        }

        Ok(data)
    }

    /// Sends the GET, retrying only transport-level failures.
    async fn send_with_retry(
        &self,
        url: &str,
        endpoint: &str,
    ) -> Result<reqwest::Response, SwapiError> {
        let mut attempt = 0;
        loop {
            match self.http.get(url).send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.config.retries => {
                    attempt += 1;
                    warn!(endpoint, attempt, error = %e, "upstream request failed, retrying");
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
                Err(e) => {
                    error!(endpoint, error = %e, "upstream request failed");
                    return Err(SwapiError::ExternalServiceUnavailable(e.to_string()));
                }
            }
        }
    }
}

impl CacheStatus for SwapiClient {
    fn was_last_request_cached(&self) -> bool {
        self.last_request_cached.load(Ordering::SeqCst)
    }
}

fn cache_key(endpoint: &str) -> String {
    format!("swapi:{}", hex::encode(Sha256::digest(endpoint.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> SwapiClient {
        let config = UpstreamConfig {
            base_url,
            retry_delay_ms: 10,
            ..UpstreamConfig::default()
        };
        SwapiClient::new(
            build_http_client(&config).unwrap(),
            Arc::new(MemoryCache::new()),
            config,
        )
    }

    #[test]
    fn test_cache_key_depends_on_full_endpoint() {
        assert_ne!(cache_key("/people/?name=luke"), cache_key("/people/?name=leia"));
        assert_eq!(cache_key("/films/1"), cache_key("/films/1"));
        assert!(cache_key("/films/1").starts_with("swapi:"));
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/films/1",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"result": {"uid": "1", "properties": {"title": "A New Hope"}}}))
                }),
            )
            .with_state(hits.clone());
        let client = client_for(spawn_upstream(router).await);

        let first = client.get_film("1").await.unwrap();
        assert!(!client.was_last_request_cached());

        let second = client.get_film("1").await.unwrap();
        assert!(client.was_last_request_cached());
        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // A different endpoint misses again and resets the flag.
        let _ = client.get_film("2").await.unwrap();
        assert!(!client.was_last_request_cached());
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let router = Router::new().route(
            "/people/",
            get(
                |axum::extract::RawQuery(q): axum::extract::RawQuery| async move {
                    Json(json!({ "query": q }))
                },
            ),
        );
        let client = client_for(spawn_upstream(router).await);
        let body = client.search_people("luke sky").await.unwrap();
        assert_eq!(body["query"], "name=luke%20sky");
    }

    #[tokio::test]
    async fn test_not_found_is_empty_object() {
        let router = Router::new().route("/people/999", get(|| async { StatusCode::NOT_FOUND }));
        let client = client_for(spawn_upstream(router).await);
        let body = client.get_person("999").await.unwrap();
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_error() {
        let router = Router::new().route(
            "/films/",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let client = client_for(spawn_upstream(router).await);
        let err = client.search_films("hope").await.unwrap_err();
        assert!(matches!(err, SwapiError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let router = Router::new().route(
            "/films/3",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let client = client_for(spawn_upstream(router).await);
        match client.get_film("3").await {
            Err(SwapiError::ExternalServiceUnavailable(detail)) => assert_eq!(detail, "HTTP 500"),
            other => panic!("expected upstream unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/films/5",
                get(|State(calls): State<Arc<AtomicUsize>>| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    StatusCode::BAD_GATEWAY
                }),
            )
            .with_state(calls.clone());
        let client = client_for(spawn_upstream(router).await);
        assert!(client.get_film("5").await.is_err());
        assert!(client.get_film("5").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_unavailable() {
        // Reserve a port, then close it so connections are refused.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}", addr));
        let err = client.get_person("1").await.unwrap_err();
        assert!(matches!(err, SwapiError::ExternalServiceUnavailable(_)));
        assert!(!client.was_last_request_cached());
    }

    #[tokio::test]
    async fn test_transport_failure_is_retried_twice() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        tokio::spawn(async move {
            // Accept and hang up before any response is written.
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(socket);
            }
        });

        let client = client_for(format!("http://{}", addr));
        let err = client.get_film("1").await.unwrap_err();
        assert!(matches!(err, SwapiError::ExternalServiceUnavailable(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
