//! User administration API endpoints
//!
//! Handles HTTP requests for account management (admin only):
//! - POST /v1/user - Create an account
//! - GET /v1/user/list - List accounts
//! - GET /v1/user/{id} - Get one account
//! - PUT /v1/user - Update an account (id in body)
//! - DELETE /v1/user/{id} - Delete an account

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ListResponse, MessageResponse};
use crate::models::{
    CreateUserInput, Filter, Gender, UpdateUserInput, User, UserRole, UserStatus, UserType,
};
use crate::services::user::UserServiceError;

const SEARCH_COLUMNS: &[&str] = &["name", "email"];
const ORDER_COLUMNS: &[&str] = &["created_at", "updated_at", "name", "email"];

/// Request body for creating an account
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub gender: Gender,
}

/// Request body for updating an account
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Option<UserRole>,
    pub user_type: Option<UserType>,
    pub status: Option<UserStatus>,
}

/// Column filters for the account list
#[derive(Debug, Deserialize)]
pub struct UserListFilter {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

/// Build the user router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/list", get(list_users))
        .route("/{id}", get(get_user))
        .route("/", put(update_user))
        .route("/{id}", delete(delete_user))
}

/// POST /v1/user - Create an account
async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_service
        .create(CreateUserInput {
            name: body.name,
            email: body.email,
            password: body.password,
            gender: body.gender,
        })
        .await
        .map_err(map_user_error)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/user/list - List accounts
async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserListFilter>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<User>>, ApiError> {
    let mut params = query.into_params(SEARCH_COLUMNS, ORDER_COLUMNS);
    if let Some(role) = filter.role {
        // Query parameter is `role`, the column is `user_role`.
        params = params.with_filter(Filter::eq("user_role", role.to_string()));
    }
    if let Some(status) = filter.status {
        params = params.with_filter(Filter::eq("status", status.to_string()));
    }

    let result = state
        .user_service
        .get_list(&params)
        .await
        .map_err(map_user_error)?;

    Ok(Json(result.into()))
}

/// GET /v1/user/{id} - Get one account
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state.user_service.get(&id).await.map_err(map_user_error)?;

    Ok(Json(user))
}

/// PUT /v1/user - Update an account
async fn update_user(
    State(state): State<AppState>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .user_service
        .update(
            &body.id,
            UpdateUserInput {
                name: body.name,
                email: body.email,
                password: body.password,
                bio: body.bio,
                profile_picture: body.profile_picture,
                role: body.role,
                user_type: body.user_type,
                status: body.status,
            },
        )
        .await
        .map_err(map_user_error)?;

    Ok(Json(user))
}

/// DELETE /v1/user/{id} - Delete an account
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .user_service
        .delete(&id)
        .await
        .map_err(map_user_error)?;

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

fn map_user_error(e: UserServiceError) -> ApiError {
    match e {
        UserServiceError::NotFound => ApiError::not_found(e.to_string()),
        UserServiceError::EmailExists => ApiError::conflict(e.to_string()),
        UserServiceError::ValidationError(msg) => ApiError::bad_request(msg),
        UserServiceError::WeakPassword(_) => ApiError::bad_request(e.to_string()),
        UserServiceError::InternalError(_) => ApiError::internal_error(e.to_string()),
    }
}
