//! Person and film lookup behind repository traits.
//!
//! The traits are the seam between use cases and the upstream API: the
//! SWAPI-backed implementations translate raw responses into entities,
//! and tests substitute in-memory doubles.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::client::SwapiClient;
use crate::error::{EntityKind, SwapiError};
use crate::models::{Film, Person, Properties};
use crate::query::SearchQuery;

#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// All people matching `query`. No matches is an empty list, not an error.
    async fn search_by_name(&self, query: &SearchQuery) -> Result<Vec<Person>, SwapiError>;

    /// The person with `id`, or [`SwapiError::EntityNotFound`].
    async fn find_by_id(&self, id: &str) -> Result<Person, SwapiError>;
}

#[async_trait]
pub trait FilmRepository: Send + Sync {
    async fn search_by_title(&self, query: &SearchQuery) -> Result<Vec<Film>, SwapiError>;

    async fn find_by_id(&self, id: &str) -> Result<Film, SwapiError>;
}

/// Maps each `result[*]` item of a search response through `build`.
fn map_search_results<T>(data: &Value, build: impl Fn(String, &Properties) -> T) -> Vec<T> {
    let empty = Properties::new();
    data.get("result")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let props = item
                        .get("properties")
                        .and_then(Value::as_object)
                        .unwrap_or(&empty);
                    build(uid_of(item).unwrap_or_default(), props)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Unpacks a lookup response into `(uid, properties)`.
fn lookup_result<'a>(data: &'a Value, requested_id: &str) -> Option<(String, &'a Properties)> {
    let result = data.get("result")?;
    let props = result.get("properties")?.as_object()?;
    let uid = uid_of(result).unwrap_or_else(|| requested_id.to_string());
    Some((uid, props))
}

/// Upstream uids are strings, but numbers are accepted too.
fn uid_of(item: &Value) -> Option<String> {
    match item.get("uid")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct SwapiPersonRepository {
    client: Arc<SwapiClient>,
}

impl SwapiPersonRepository {
    pub fn new(client: Arc<SwapiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PersonRepository for SwapiPersonRepository {
    async fn search_by_name(&self, query: &SearchQuery) -> Result<Vec<Person>, SwapiError> {
        let data = self.client.search_people(query.as_str()).await?;
        Ok(map_search_results(&data, |uid, props| {
            Person::from_properties(uid, props)
        }))
    }

    async fn find_by_id(&self, id: &str) -> Result<Person, SwapiError> {
        let data = self.client.get_person(id).await?;
        let (uid, props) = lookup_result(&data, id)
            .ok_or_else(|| SwapiError::not_found(EntityKind::Person, id))?;
        Ok(Person::from_properties(uid, props))
    }
}

pub struct SwapiFilmRepository {
    client: Arc<SwapiClient>,
}

impl SwapiFilmRepository {
    pub fn new(client: Arc<SwapiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FilmRepository for SwapiFilmRepository {
    async fn search_by_title(&self, query: &SearchQuery) -> Result<Vec<Film>, SwapiError> {
        let data = self.client.search_films(query.as_str()).await?;
        Ok(map_search_results(&data, |uid, props| {
            Film::from_properties(uid, props)
        }))
    }

    async fn find_by_id(&self, id: &str) -> Result<Film, SwapiError> {
        let data = self.client.get_film(id).await?;
        let (uid, props) = lookup_result(&data, id)
            .ok_or_else(|| SwapiError::not_found(EntityKind::Film, id))?;
        Ok(Film::from_properties(uid, props))
    }
}
