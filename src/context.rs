//! Process-wide resources and the per-request object graph built from them.
//!
//! [`AppContext`] owns what is shared across requests: configuration, the
//! SQLite pool, the HTTP connection pool and the cache store.
//! [`AppContext::request_services`] wires a fresh [`SwapiClient`],
//! repositories, query logger and use cases for a single request, so the
//! client's "last call was cached" flag is never shared between requests.

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::cache::{self, CacheStore};
use crate::client::{build_http_client, SwapiClient};
use crate::config::Config;
use crate::db;
use crate::metrics::MetricsService;
use crate::migrate;
use crate::query_log::QueryLogger;
use crate::repository::{
    FilmRepository, PersonRepository, SwapiFilmRepository, SwapiPersonRepository,
};
use crate::usecases::{FilmUseCases, PeopleUseCases};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub http: reqwest::Client,
    pub cache: Arc<dyn CacheStore>,
    pub metrics: Arc<MetricsService>,
}

/// Use cases for one request.
pub struct RequestServices {
    pub people: PeopleUseCases,
    pub films: FilmUseCases,
}

impl AppContext {
    /// Connects to the configured database, applies migrations and builds
    /// the shared clients.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Self::from_parts(config.clone(), pool)
    }

    pub fn from_parts(config: Config, pool: SqlitePool) -> Result<Self> {
        let cache = cache::from_config(&config, &pool)?;
        let http = build_http_client(&config.upstream)?;
        let metrics = Arc::new(MetricsService::new(pool.clone(), cache.clone()));
        Ok(Self {
            config: Arc::new(config),
            pool,
            http,
            cache,
            metrics,
        })
    }

    pub fn request_services(&self) -> RequestServices {
        let client = Arc::new(SwapiClient::new(
            self.http.clone(),
            self.cache.clone(),
            self.config.upstream.clone(),
        ));
        let people: Arc<dyn PersonRepository> =
            Arc::new(SwapiPersonRepository::new(client.clone()));
        let films: Arc<dyn FilmRepository> = Arc::new(SwapiFilmRepository::new(client.clone()));
        let logger = Arc::new(QueryLogger::new(self.pool.clone(), client));

        RequestServices {
            people: PeopleUseCases::new(people.clone(), films.clone(), logger.clone()),
            films: FilmUseCases::new(films, people, logger),
        }
    }
}
