//! Search request validation and client-side pagination.
//!
//! The upstream API returns every match at once; this module slices the
//! full result list into the requested page.

use serde::{Deserialize, Serialize};

use crate::context::RequestServices;
use crate::error::SwapiError;
use crate::models::{FilmSummary, PersonSummary};
use crate::query::{SearchQuery, SearchType};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 50;

/// Raw search parameters as received from a client.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(rename = "type")]
    pub search_type: Option<String>,
    pub query: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// One entry of a search listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchHit {
    Person(PersonSummary),
    Film(FilmSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub data: Vec<SearchHit>,
    pub pagination: Pagination,
}

/// Validated form of [`SearchParams`].
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub search_type: SearchType,
    pub query: SearchQuery,
    pub page: u32,
    pub per_page: u32,
}

impl SearchParams {
    pub fn validate(self) -> Result<SearchRequest, SwapiError> {
        let search_type = match self.search_type.as_deref() {
            Some(raw) => raw.parse::<SearchType>()?,
            None => {
                return Err(SwapiError::InvalidInput(
                    "Please select a search type (people or films).".to_string(),
                ))
            }
        };

        let query = match self.query.as_deref() {
            Some(raw) => SearchQuery::new(raw)?,
            None => {
                return Err(SwapiError::InvalidInput(
                    "Please enter a search term.".to_string(),
                ))
            }
        };

        let page = self.page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            return Err(SwapiError::InvalidInput(
                "Page must be at least 1.".to_string(),
            ));
        }

        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(SwapiError::InvalidInput(format!(
                "Per page must be between 1 and {}.",
                MAX_PER_PAGE
            )));
        }

        Ok(SearchRequest {
            search_type,
            query,
            page,
            per_page,
        })
    }
}

/// Slices `items` into page `page` of size `per_page`.
///
/// Pages past the end are empty; `total_pages` is 0 for an empty list.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> (Vec<T>, Pagination) {
    let total = items.len();
    let size = per_page.max(1) as usize;
    let total_pages = total.div_ceil(size);
    let offset = (page.max(1) as usize - 1).saturating_mul(size);

    let slice = items.into_iter().skip(offset).take(size).collect();
    (
        slice,
        Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    )
}

/// Runs a validated search through the matching use case and paginates it.
pub async fn run_search(
    services: &RequestServices,
    request: &SearchRequest,
) -> Result<SearchResponse, SwapiError> {
    let hits: Vec<SearchHit> = match request.search_type {
        SearchType::People => services
            .people
            .search_by_name(&request.query)
            .await?
            .into_iter()
            .map(SearchHit::Person)
            .collect(),
        SearchType::Films => services
            .films
            .search_by_title(&request.query)
            .await?
            .into_iter()
            .map(SearchHit::Film)
            .collect(),
    };

    let (data, pagination) = paginate(hits, request.page, request.per_page);
    Ok(SearchResponse { data, pagination })
}

/// Detail ids must be non-empty and all ASCII digits.
pub fn validate_id(id: &str) -> Result<&str, SwapiError> {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(id)
    } else {
        Err(SwapiError::InvalidInput(format!(
            "ID must be numeric, got '{}'.",
            id
        )))
    }
}
