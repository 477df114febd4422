//! HTTP surface of the review platform.
//!
//! Handlers are grouped per resource (auth, users, sessions, businesses,
//! business categories, reviews) and mounted under `/v1`. Every route in
//! that tree passes through the authorization middleware, which matches
//! the caller's role against the configured policy rules before the
//! handler runs.

pub mod auth;
pub mod businesses;
pub mod categories;
pub mod common;
pub mod middleware;
pub mod responses;
pub mod reviews;
pub mod sessions;
pub mod users;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthIdentity};

/// Response for the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// Build the versioned API router with authorization applied
///
/// Routes are nested directly under their full /v1 prefixes so the matched
/// path seen by the authorization middleware is the complete route pattern.
pub fn build_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/v1/auth", auth::router())
        .nest("/v1/user", users::router())
        .nest("/v1/session", sessions::router())
        .nest("/v1/business", businesses::router())
        .nest("/v1/business-category", categories::router())
        .nest("/v1/review", reviews::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::authorize,
        ))
}

/// Assemble the full application router: health probe, versioned API,
/// CORS, compression, and request tracing.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .route("/healthz", get(health))
        .merge(build_api_router(state.clone()))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /healthz - Liveness check backed by a database ping
///
/// Stays outside the authorization middleware so load balancers can probe
/// without a token.
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state
        .pool
        .ping()
        .await
        .map_err(|e| ApiError::internal_error(format!("Database unreachable: {}", e)))?;

    Ok(Json(HealthResponse {
        status: "ok",
        database: "reachable",
    }))
}
