//! Error taxonomy and the mapping to client-facing outcomes.
//!
//! Every failure the core can surface is a [`SwapiError`]. The HTTP layer
//! never inspects messages: it calls [`SwapiError::outcome`] once and
//! renders the resulting [`Outcome`].
//!
//! | Error | Outcome | Status |
//! |-------|---------|--------|
//! | `InvalidInput` | `InvalidInput` | 422 |
//! | `EntityNotFound` | `NotFound` | 404 |
//! | `RateLimitExceeded` | `TooManyRequests` | 429 |
//! | `ExternalServiceUnavailable` | `UpstreamUnavailable` | 502 |
//! | `Internal` | `Unexpected` | 500 |

use std::fmt;
use thiserror::Error;

/// The two kinds of upstream entity this service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Film,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Person => f.write_str("Person"),
            EntityKind::Film => f.write_str("Film"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SwapiError {
    /// Input rejected before any upstream call.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{kind} with ID '{id}' was not found.")]
    EntityNotFound { kind: EntityKind, id: String },

    /// Upstream answered 429.
    #[error("API rate limit exceeded. Please try again shortly.")]
    RateLimitExceeded,

    /// Transport failure or an unexpected upstream status.
    #[error("The Star Wars API is currently unavailable. Detail: {0}")]
    ExternalServiceUnavailable(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Client-facing outcome category for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InvalidInput,
    NotFound,
    TooManyRequests,
    UpstreamUnavailable,
    Unexpected,
}

impl Outcome {
    pub fn status_code(self) -> u16 {
        match self {
            Outcome::InvalidInput => 422,
            Outcome::NotFound => 404,
            Outcome::TooManyRequests => 429,
            Outcome::UpstreamUnavailable => 502,
            Outcome::Unexpected => 500,
        }
    }

    /// Machine-readable code used in error bodies.
    pub fn code(self) -> &'static str {
        match self {
            Outcome::InvalidInput => "invalid_input",
            Outcome::NotFound => "not_found",
            Outcome::TooManyRequests => "too_many_requests",
            Outcome::UpstreamUnavailable => "upstream_unavailable",
            Outcome::Unexpected => "internal",
        }
    }
}

impl SwapiError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        SwapiError::EntityNotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            SwapiError::InvalidInput(_) => Outcome::InvalidInput,
            SwapiError::EntityNotFound { .. } => Outcome::NotFound,
            SwapiError::RateLimitExceeded => Outcome::TooManyRequests,
            SwapiError::ExternalServiceUnavailable(_) => Outcome::UpstreamUnavailable,
            SwapiError::Internal(_) => Outcome::Unexpected,
        }
    }

    /// Message safe to show a client. Unexpected errors get a generic text.
    pub fn public_message(&self) -> String {
        match self {
            SwapiError::Internal(_) => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}
