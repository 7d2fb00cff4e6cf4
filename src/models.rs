//! Domain entities mapped from upstream JSON, and the views returned to clients.
//!
//! [`Person`] and [`Film`] keep only the upstream properties this service
//! uses. Missing properties fall back to fixed defaults so construction
//! never fails.

use serde::Serialize;
use serde_json::{Map, Value};

/// Raw `properties` object of an upstream entity.
pub type Properties = Map<String, Value>;

/// A Star Wars character.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub uid: String,
    pub name: String,
    pub birth_year: String,
    pub gender: String,
    pub eye_color: String,
    pub hair_color: String,
    pub height: String,
    pub mass: String,
    pub film_urls: Vec<String>,
}

/// A Star Wars film.
#[derive(Debug, Clone, PartialEq)]
pub struct Film {
    pub uid: String,
    pub title: String,
    pub opening_crawl: String,
    pub character_urls: Vec<String>,
}

/// Slim person view used in search listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonSummary {
    pub uid: String,
    pub name: String,
}

/// Slim film view used in search listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilmSummary {
    pub uid: String,
    pub title: String,
}

/// Full person view with films resolved to titles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonDetails {
    pub uid: String,
    pub name: String,
    pub birth_year: String,
    pub gender: String,
    pub eye_color: String,
    pub hair_color: String,
    pub height: String,
    pub mass: String,
    pub films: Vec<FilmSummary>,
}

/// Full film view with characters resolved to names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilmDetails {
    pub uid: String,
    pub title: String,
    pub opening_crawl: String,
    pub characters: Vec<PersonSummary>,
}

fn string_prop(props: &Properties, key: &str, default: &str) -> String {
    props
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn url_list_prop(props: &Properties, key: &str) -> Vec<String> {
    props
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the trailing id segment of each resource URL, in order.
///
/// `https://www.swapi.tech/api/people/10/` and `.../people/10` both yield `"10"`.
pub fn extract_ids<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    urls.iter()
        .map(|url| {
            url.as_ref()
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

impl Person {
    pub fn from_properties(uid: impl Into<String>, props: &Properties) -> Self {
        Self {
            uid: uid.into(),
            name: string_prop(props, "name", "Unknown"),
            birth_year: string_prop(props, "birth_year", "unknown"),
            gender: string_prop(props, "gender", "unknown"),
            eye_color: string_prop(props, "eye_color", "unknown"),
            hair_color: string_prop(props, "hair_color", "unknown"),
            height: string_prop(props, "height", "unknown"),
            mass: string_prop(props, "mass", "unknown"),
            film_urls: url_list_prop(props, "films"),
        }
    }

    pub fn film_ids(&self) -> Vec<String> {
        extract_ids(&self.film_urls)
    }

    pub fn summary(&self) -> PersonSummary {
        PersonSummary {
            uid: self.uid.clone(),
            name: self.name.clone(),
        }
    }

    /// Full view with the given films in place of the raw film ids.
    pub fn details(self, films: Vec<FilmSummary>) -> PersonDetails {
        PersonDetails {
            uid: self.uid,
            name: self.name,
            birth_year: self.birth_year,
            gender: self.gender,
            eye_color: self.eye_color,
            hair_color: self.hair_color,
            height: self.height,
            mass: self.mass,
            films,
        }
    }
}

impl Film {
    pub fn from_properties(uid: impl Into<String>, props: &Properties) -> Self {
        Self {
            uid: uid.into(),
            title: string_prop(props, "title", "Unknown"),
            opening_crawl: string_prop(props, "opening_crawl", ""),
            character_urls: url_list_prop(props, "characters"),
        }
    }

    pub fn character_ids(&self) -> Vec<String> {
        extract_ids(&self.character_urls)
    }

    pub fn summary(&self) -> FilmSummary {
        FilmSummary {
            uid: self.uid.clone(),
            title: self.title.clone(),
        }
    }

    /// Full view with the given characters in place of the raw character ids.
    pub fn details(self, characters: Vec<PersonSummary>) -> FilmDetails {
        FilmDetails {
            uid: self.uid,
            title: self.title,
            opening_crawl: self.opening_crawl,
            characters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_extract_ids_trailing_slash_insensitive() {
        let with = ["https://www.swapi.tech/api/people/1/", ".../people/10/"];
        let without = ["https://www.swapi.tech/api/people/1", ".../people/10"];
        assert_eq!(extract_ids(&with), extract_ids(&without));
        assert_eq!(extract_ids(&with), vec!["1", "10"]);
    }

    #[test]
    fn test_extract_ids_empty() {
        let empty: [&str; 0] = [];
        assert!(extract_ids(&empty).is_empty());
    }

    #[test]
    fn test_extract_ids_preserves_order() {
        let urls = ["/films/6", "/films/3", "/films/1"];
        assert_eq!(extract_ids(&urls), vec!["6", "3", "1"]);
    }

    #[test]
    fn test_person_defaults_from_empty_properties() {
        let person = Person::from_properties("1", &Properties::new());
        assert_eq!(person.name, "Unknown");
        assert_eq!(person.birth_year, "unknown");
        assert_eq!(person.gender, "unknown");
        assert_eq!(person.eye_color, "unknown");
        assert_eq!(person.hair_color, "unknown");
        assert_eq!(person.height, "unknown");
        assert_eq!(person.mass, "unknown");
        assert!(person.film_ids().is_empty());
    }

    #[test]
    fn test_film_defaults_from_empty_properties() {
        let film = Film::from_properties("4", &Properties::new());
        assert_eq!(film.uid, "4");
        assert_eq!(film.title, "Unknown");
        assert_eq!(film.opening_crawl, "");
        assert!(film.character_ids().is_empty());
    }

    #[test]
    fn test_person_maps_properties() {
        let person = Person::from_properties(
            "1",
            &props(json!({
                "name": "Luke Skywalker",
                "birth_year": "19BBY",
                "gender": "male",
                "eye_color": "blue",
                "hair_color": "blond",
                "height": "172",
                "mass": "77",
                "films": [
                    "https://www.swapi.tech/api/films/1",
                    "https://www.swapi.tech/api/films/2/"
                ],
                "homeworld": "https://www.swapi.tech/api/planets/1"
            })),
        );
        assert_eq!(person.name, "Luke Skywalker");
        assert_eq!(person.mass, "77");
        assert_eq!(person.film_ids(), vec!["1", "2"]);
        assert_eq!(
            person.summary(),
            PersonSummary {
                uid: "1".into(),
                name: "Luke Skywalker".into()
            }
        );
    }

    #[test]
    fn test_film_details_serialization_has_no_raw_ids() {
        let film = Film::from_properties(
            "1",
            &props(json!({
                "title": "A New Hope",
                "opening_crawl": "It is a period of civil war.",
                "characters": ["https://www.swapi.tech/api/people/1"]
            })),
        );
        let details = film.details(vec![PersonSummary {
            uid: "1".into(),
            name: "Luke Skywalker".into(),
        }]);
        let value = serde_json::to_value(&details).unwrap();
        assert!(value.get("character_ids").is_none());
        assert_eq!(value["characters"][0]["name"], "Luke Skywalker");
    }
}
