//! Session administration API endpoints
//!
//! Handles HTTP requests for session inspection (admin only). Sessions are
//! created by sign-in, never through this API:
//! - GET /v1/session/list - List sessions
//! - GET /v1/session/{id} - Get one session
//! - PUT /v1/session - Update session metadata (id in body)
//! - DELETE /v1/session/{id} - Delete a session

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ListResponse, MessageResponse};
use crate::models::{Filter, Session, SessionPlatform, UpdateSessionInput};
use crate::services::session::SessionServiceError;

const SEARCH_COLUMNS: &[&str] = &["user_agent", "ip_address"];
const ORDER_COLUMNS: &[&str] = &["created_at", "updated_at"];

/// Request body for updating a session
#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub id: String,
    pub user_agent: Option<String>,
    pub platform: Option<SessionPlatform>,
    pub ip_address: Option<String>,
}

/// Column filters for the session list
#[derive(Debug, Deserialize)]
pub struct SessionListFilter {
    pub user_id: Option<String>,
}

/// Build the session router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", get(list_sessions))
        .route("/{id}", get(get_session))
        .route("/", put(update_session))
        .route("/{id}", delete(delete_session))
}

/// GET /v1/session/list - List sessions
async fn list_sessions(
    State(state): State<AppState>,
    Query(filter): Query<SessionListFilter>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Session>>, ApiError> {
    let mut params = query.into_params(SEARCH_COLUMNS, ORDER_COLUMNS);
    if let Some(user_id) = filter.user_id {
        params = params.with_filter(Filter::eq("user_id", user_id));
    }

    let result = state
        .session_service
        .get_list(&params)
        .await
        .map_err(map_session_error)?;

    Ok(Json(result.into()))
}

/// GET /v1/session/{id} - Get one session
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .session_service
        .get(&id)
        .await
        .map_err(map_session_error)?;

    Ok(Json(session))
}

/// PUT /v1/session - Update session metadata
async fn update_session(
    State(state): State<AppState>,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .session_service
        .update(
            &body.id,
            UpdateSessionInput {
                user_agent: body.user_agent,
                platform: body.platform,
                ip_address: body.ip_address,
            },
        )
        .await
        .map_err(map_session_error)?;

    Ok(Json(session))
}

/// DELETE /v1/session/{id} - Delete a session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .session_service
        .delete(&id)
        .await
        .map_err(map_session_error)?;

    Ok(Json(MessageResponse::new("Session deleted successfully")))
}

fn map_session_error(e: SessionServiceError) -> ApiError {
    match e {
        SessionServiceError::NotFound => ApiError::not_found(e.to_string()),
        SessionServiceError::InternalError(_) => ApiError::internal_error(e.to_string()),
    }
}
