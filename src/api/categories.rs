//! Business category API endpoints
//!
//! Handles HTTP requests for the category vocabulary (admin-managed, publicly
//! readable):
//! - POST /v1/business-category - Create a category
//! - GET /v1/business-category/list - List categories
//! - GET /v1/business-category/{id} - Get one category
//! - PUT /v1/business-category - Rename a category (id in body)
//! - DELETE /v1/business-category/{id} - Delete a category

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ListResponse, MessageResponse};
use crate::models::{BusinessCategory, CreateCategoryInput, UpdateCategoryInput};
use crate::services::category::CategoryServiceError;

const SEARCH_COLUMNS: &[&str] = &["name"];
const ORDER_COLUMNS: &[&str] = &["created_at", "updated_at", "name"];

/// Request body for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// Request body for renaming a category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub id: String,
    pub name: Option<String>,
}

/// Build the business category router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/list", get(list_categories))
        .route("/{id}", get(get_category))
        .route("/", put(update_category))
        .route("/{id}", delete(delete_category))
}

/// POST /v1/business-category - Create a category
async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<BusinessCategory>), ApiError> {
    let category = state
        .category_service
        .create(CreateCategoryInput { name: body.name })
        .await
        .map_err(map_category_error)?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /v1/business-category/list - List categories
async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<BusinessCategory>>, ApiError> {
    let params = query.into_params(SEARCH_COLUMNS, ORDER_COLUMNS);

    let result = state
        .category_service
        .get_list(&params)
        .await
        .map_err(map_category_error)?;

    Ok(Json(result.into()))
}

/// GET /v1/business-category/{id} - Get one category
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BusinessCategory>, ApiError> {
    let category = state
        .category_service
        .get(&id)
        .await
        .map_err(map_category_error)?;

    Ok(Json(category))
}

/// PUT /v1/business-category - Rename a category
async fn update_category(
    State(state): State<AppState>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<BusinessCategory>, ApiError> {
    let category = state
        .category_service
        .update(&body.id, UpdateCategoryInput { name: body.name })
        .await
        .map_err(map_category_error)?;

    Ok(Json(category))
}

/// DELETE /v1/business-category/{id} - Delete a category
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .category_service
        .delete(&id)
        .await
        .map_err(map_category_error)?;

    Ok(Json(MessageResponse::new(
        "BusinessCategory deleted successfully",
    )))
}

fn map_category_error(e: CategoryServiceError) -> ApiError {
    match e {
        CategoryServiceError::NotFound => ApiError::not_found(e.to_string()),
        CategoryServiceError::DuplicateName(_) => ApiError::conflict(e.to_string()),
        CategoryServiceError::ValidationError(msg) => ApiError::bad_request(msg),
        CategoryServiceError::InternalError(_) => ApiError::internal_error(e.to_string()),
    }
}
