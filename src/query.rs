//! Search input values: the validated query text and the search type.

use std::fmt;
use std::str::FromStr;

use crate::error::SwapiError;

pub const MAX_QUERY_CHARS: usize = 100;

/// A trimmed, non-empty search string of at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(raw: &str) -> Result<Self, SwapiError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SwapiError::InvalidInput(
                "Search query cannot be empty.".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_QUERY_CHARS {
            return Err(SwapiError::InvalidInput(format!(
                "Search query cannot exceed {} characters.",
                MAX_QUERY_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    People,
    Films,
}

impl SearchType {
    /// Label stored in `query_logs.search_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::People => "people",
            SearchType::Films => "films",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = SwapiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "people" => Ok(SearchType::People),
            "films" => Ok(SearchType::Films),
            _ => Err(SwapiError::InvalidInput(
                "Search type must be either \"people\" or \"films\".".to_string(),
            )),
        }
    }
}
