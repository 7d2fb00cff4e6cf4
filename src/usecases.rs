//! People and film use cases: logged searches and detail pages.
//!
//! Searches run through [`QueryLogger::execute_and_log`]. Detail lookups
//! are not logged; they fetch the entity and then resolve each linked id
//! one by one. A link that cannot be resolved becomes a placeholder
//! (`"Character #<id>"` / `"Film #<id>"`) and never fails the page.

use std::sync::Arc;
use tracing::warn;

use crate::error::SwapiError;
use crate::models::{FilmDetails, FilmSummary, PersonDetails, PersonSummary};
use crate::query::{SearchQuery, SearchType};
use crate::query_log::QueryLogger;
use crate::repository::{FilmRepository, PersonRepository};

pub struct PeopleUseCases {
    people: Arc<dyn PersonRepository>,
    films: Arc<dyn FilmRepository>,
    logger: Arc<QueryLogger>,
}

impl PeopleUseCases {
    pub fn new(
        people: Arc<dyn PersonRepository>,
        films: Arc<dyn FilmRepository>,
        logger: Arc<QueryLogger>,
    ) -> Self {
        Self {
            people,
            films,
            logger,
        }
    }

    pub async fn search_by_name(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<PersonSummary>, SwapiError> {
        self.logger
            .execute_and_log(SearchType::People, query, || async {
                let people = self.people.search_by_name(query).await?;
                Ok::<_, SwapiError>(people.iter().map(|p| p.summary()).collect())
            })
            .await
    }

    pub async fn get_details(&self, person_id: &str) -> Result<PersonDetails, SwapiError> {
        let person = self.people.find_by_id(person_id).await?;

        let mut films = Vec::new();
        for film_id in person.film_ids() {
            let title = match self.films.find_by_id(&film_id).await {
                Ok(film) => film.title,
                Err(e) => {
                    warn!(
                        person_id,
                        film_id = %film_id,
                        error = %e,
                        "failed to resolve film for person details"
                    );
                    format!("Film #{}", film_id)
                }
            };
            films.push(FilmSummary {
                uid: film_id,
                title,
            });
        }

        Ok(person.details(films))
    }
}

pub struct FilmUseCases {
    films: Arc<dyn FilmRepository>,
    people: Arc<dyn PersonRepository>,
    logger: Arc<QueryLogger>,
}

impl FilmUseCases {
    pub fn new(
        films: Arc<dyn FilmRepository>,
        people: Arc<dyn PersonRepository>,
        logger: Arc<QueryLogger>,
    ) -> Self {
        Self {
            films,
            people,
            logger,
        }
    }

    pub async fn search_by_title(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<FilmSummary>, SwapiError> {
        self.logger
            .execute_and_log(SearchType::Films, query, || async {
                let films = self.films.search_by_title(query).await?;
                Ok::<_, SwapiError>(films.iter().map(|f| f.summary()).collect())
            })
            .await
    }

    pub async fn get_details(&self, film_id: &str) -> Result<FilmDetails, SwapiError> {
        let film = self.films.find_by_id(film_id).await?;

        let mut characters = Vec::new();
        for character_id in film.character_ids() {
            let name = match self.people.find_by_id(&character_id).await {
                Ok(person) => person.name,
                Err(e) => {
                    warn!(
                        film_id,
                        character_id = %character_id,
                        error = %e,
                        "failed to resolve character for film details"
                    );
                    format!("Character #{}", character_id)
                }
            };
            characters.push(PersonSummary {
                uid: character_id,
                name,
            });
        }

        Ok(film.details(characters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;
    use crate::models::{Film, Person};
    use crate::query_log::tests::{logged_rows, migrated_pool, FixedCacheStatus};
    use async_trait::async_trait;
    use serde_json::json;
    use sqlx::SqlitePool;
    use std::collections::HashMap;

    /// In-memory people keyed by id; `search_error` makes every search fail.
    #[derive(Default)]
    struct StubPeople {
        by_id: HashMap<String, Person>,
        search_error: bool,
    }

    #[async_trait]
    impl PersonRepository for StubPeople {
        async fn search_by_name(&self, query: &SearchQuery) -> Result<Vec<Person>, SwapiError> {
            if self.search_error {
                return Err(SwapiError::ExternalServiceUnavailable("HTTP 503".into()));
            }
            let needle = query.as_str().to_lowercase();
            let mut found: Vec<Person> = self
                .by_id
                .values()
                .filter(|p| p.name.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            found.sort_by(|a, b| a.uid.cmp(&b.uid));
            Ok(found)
        }

        async fn find_by_id(&self, id: &str) -> Result<Person, SwapiError> {
            self.by_id
                .get(id)
                .cloned()
                .ok_or_else(|| SwapiError::not_found(EntityKind::Person, id))
        }
    }

    #[derive(Default)]
    struct StubFilms {
        by_id: HashMap<String, Film>,
        search_error: bool,
    }

    #[async_trait]
    impl FilmRepository for StubFilms {
        async fn search_by_title(&self, query: &SearchQuery) -> Result<Vec<Film>, SwapiError> {
            if self.search_error {
                return Err(SwapiError::RateLimitExceeded);
            }
            let needle = query.as_str().to_lowercase();
            let mut found: Vec<Film> = self
                .by_id
                .values()
                .filter(|f| f.title.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            found.sort_by(|a, b| a.uid.cmp(&b.uid));
            Ok(found)
        }

        async fn find_by_id(&self, id: &str) -> Result<Film, SwapiError> {
            self.by_id
                .get(id)
                .cloned()
                .ok_or_else(|| SwapiError::not_found(EntityKind::Film, id))
        }
    }

    fn person(uid: &str, name: &str, films: &[&str]) -> Person {
        let props = json!({
            "name": name,
            "films": films
                .iter()
                .map(|id| format!("https://www.swapi.tech/api/films/{}", id))
                .collect::<Vec<_>>()
        });
        Person::from_properties(uid, props.as_object().unwrap())
    }

    fn film(uid: &str, title: &str, characters: &[&str]) -> Film {
        let props = json!({
            "title": title,
            "opening_crawl": "It is a period of civil war.",
            "characters": characters
                .iter()
                .map(|id| format!("https://www.swapi.tech/api/people/{}/", id))
                .collect::<Vec<_>>()
        });
        Film::from_properties(uid, props.as_object().unwrap())
    }

    fn catalog() -> (StubPeople, StubFilms) {
        let mut people = StubPeople::default();
        for p in [
            person("1", "Luke Skywalker", &["1", "2", "99"]),
            person("5", "Leia Organa", &["1"]),
        ] {
            people.by_id.insert(p.uid.clone(), p);
        }
        let mut films = StubFilms::default();
        for f in [
            film("1", "A New Hope", &["1", "999", "5"]),
            film("2", "The Empire Strikes Back", &["1"]),
        ] {
            films.by_id.insert(f.uid.clone(), f);
        }
        (people, films)
    }

    async fn use_cases(
        people: StubPeople,
        films: StubFilms,
    ) -> (PeopleUseCases, FilmUseCases, SqlitePool) {
        let pool = migrated_pool().await;
        let logger = Arc::new(QueryLogger::new(
            pool.clone(),
            Arc::new(FixedCacheStatus::default()),
        ));
        let people: Arc<dyn PersonRepository> = Arc::new(people);
        let films: Arc<dyn FilmRepository> = Arc::new(films);
        (
            PeopleUseCases::new(people.clone(), films.clone(), logger.clone()),
            FilmUseCases::new(films, people, logger),
            pool,
        )
    }

    #[tokio::test]
    async fn test_search_by_title_returns_slim_views() {
        let (people, films) = catalog();
        let (_, film_uc, pool) = use_cases(people, films).await;

        let results = film_uc
            .search_by_title(&SearchQuery::new("hope").unwrap())
            .await
            .unwrap();
        assert_eq!(
            results,
            vec![FilmSummary {
                uid: "1".into(),
                title: "A New Hope".into()
            }]
        );
        assert_eq!(
            logged_rows(&pool).await,
            vec![("films".to_string(), "hope".to_string(), 1, false, false)]
        );
    }

    #[tokio::test]
    async fn test_search_with_no_matches_logs_zero_results() {
        let (people, films) = catalog();
        let (people_uc, _, pool) = use_cases(people, films).await;

        let results = people_uc
            .search_by_name(&SearchQuery::new("zzzzz").unwrap())
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(
            logged_rows(&pool).await,
            vec![("people".to_string(), "zzzzz".to_string(), 0, false, false)]
        );
    }

    #[tokio::test]
    async fn test_failed_search_logs_error_and_propagates() {
        let (mut people, mut films) = catalog();
        people.search_error = true;
        films.search_error = true;
        let (people_uc, film_uc, pool) = use_cases(people, films).await;

        let err = people_uc
            .search_by_name(&SearchQuery::new("luke").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, SwapiError::ExternalServiceUnavailable(ref d) if d == "HTTP 503"));

        let err = film_uc
            .search_by_title(&SearchQuery::new("hope").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, SwapiError::RateLimitExceeded));

        assert_eq!(
            logged_rows(&pool).await,
            vec![
                ("people".to_string(), "luke".to_string(), 0, false, true),
                ("films".to_string(), "hope".to_string(), 0, false, true),
            ]
        );
    }

    #[tokio::test]
    async fn test_film_details_resolve_with_placeholder() {
        let (people, films) = catalog();
        let (_, film_uc, pool) = use_cases(people, films).await;

        let details = film_uc.get_details("1").await.unwrap();
        assert_eq!(details.title, "A New Hope");
        assert_eq!(
            details.characters,
            vec![
                PersonSummary {
                    uid: "1".into(),
                    name: "Luke Skywalker".into()
                },
                PersonSummary {
                    uid: "999".into(),
                    name: "Character #999".into()
                },
                PersonSummary {
                    uid: "5".into(),
                    name: "Leia Organa".into()
                },
            ]
        );

        // Detail fetches are not logged.
        assert!(logged_rows(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_person_details_resolve_with_placeholder() {
        let (people, films) = catalog();
        let (people_uc, _, _pool) = use_cases(people, films).await;

        let details = people_uc.get_details("1").await.unwrap();
        let titles: Vec<&str> = details.films.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["A New Hope", "The Empire Strikes Back", "Film #99"]
        );
        let value = serde_json::to_value(&details).unwrap();
        assert!(value.get("film_ids").is_none());
    }

    #[tokio::test]
    async fn test_missing_entity_propagates_not_found() {
        let (people, films) = catalog();
        let (people_uc, film_uc, _pool) = use_cases(people, films).await;

        assert!(matches!(
            film_uc.get_details("42").await,
            Err(SwapiError::EntityNotFound {
                kind: EntityKind::Film,
                ..
            })
        ));
        assert!(matches!(
            people_uc.get_details("42").await,
            Err(SwapiError::EntityNotFound {
                kind: EntityKind::Person,
                ..
            })
        ));
    }
}
