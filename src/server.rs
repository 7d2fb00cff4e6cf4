//! HTTP API server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/search?type=&query=&page=&per_page=` | Search people or films, paginated |
//! | `GET`  | `/api/people/{id}` | Person details with film titles resolved |
//! | `GET`  | `/api/films/{id}` | Film details with character names resolved |
//! | `GET`  | `/api/metrics` | Latest usage metrics snapshot |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Film with ID '42' was not found." } }
//! ```
//!
//! Error codes: `invalid_input` (422), `not_found` (404),
//! `too_many_requests` (429), `upstream_unavailable` (502), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser frontend
//! on another origin can call the API.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::context::AppContext;
use crate::error::{Outcome, SwapiError};
use crate::metrics::spawn_recompute_loop;
use crate::models::{FilmDetails, PersonDetails};
use crate::search::{run_search, validate_id, SearchParams, SearchResponse};

/// Starts the HTTP server and the periodic metrics recomputation.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(ctx: AppContext) -> anyhow::Result<()> {
    let bind_addr = ctx.config.server.bind.clone();

    let recompute = spawn_recompute_loop(
        ctx.metrics.clone(),
        ctx.config.metrics.recompute_interval(),
    );

    let app = router(ctx);

    info!(%bind_addr, "server listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let served = axum::serve(listener, app).await;

    recompute.abort();
    served?;
    Ok(())
}

/// Builds the router with all routes and CORS applied.
pub fn router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", get(handle_search))
        .route("/api/people/{id}", get(handle_person))
        .route("/api/films/{id}", get(handle_film))
        .route("/api/metrics", get(handle_metrics))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(ctx)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Converts a [`SwapiError`] into a response using its [`Outcome`].
struct AppError(SwapiError);

impl From<SwapiError> for AppError {
    fn from(err: SwapiError) -> Self {
        AppError(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(SwapiError::Internal(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let outcome = self.0.outcome();
        if outcome == Outcome::Unexpected {
            error!(error = ?self.0, "unhandled API error");
        }

        let status =
            StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: ErrorDetail {
                code: outcome.code().to_string(),
                message: self.0.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/search ============

async fn handle_search(
    State(ctx): State<AppContext>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Query(params) =
        params.map_err(|e| SwapiError::InvalidInput(e.body_text()))?;
    let request = params.validate()?;

    let services = ctx.request_services();
    let response = run_search(&services, &request).await?;
    Ok(Json(response))
}

// ============ GET /api/people/{id} and /api/films/{id} ============

async fn handle_person(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<PersonDetails>, AppError> {
    let id = validate_id(&id)?;
    let details = ctx.request_services().people.get_details(id).await?;
    Ok(Json(details))
}

async fn handle_film(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<FilmDetails>, AppError> {
    let id = validate_id(&id)?;
    let details = ctx.request_services().films.get_details(id).await?;
    Ok(Json(details))
}

// ============ GET /api/metrics ============

async fn handle_metrics(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, AppError> {
    let snapshot = ctx.metrics.latest().await?;
    Ok(Json(serde_json::json!({ "data": snapshot })))
}
