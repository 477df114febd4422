//! Review API endpoints
//!
//! Handles HTTP requests for reviews and their attachments:
//! - POST /v1/review - Create a review (author taken from the caller)
//! - GET /v1/review/list - List reviews
//! - GET /v1/review/{id} - Get one review
//! - PUT /v1/review - Update a review (id in body, author or admin only)
//! - DELETE /v1/review/{id} - Delete a review (author or admin only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState, AuthIdentity};
use crate::api::responses::{ListResponse, MessageResponse};
use crate::models::{AttachmentInput, CreateReviewInput, Filter, Review, UpdateReviewInput};
use crate::services::review::ReviewServiceError;

const SEARCH_COLUMNS: &[&str] = &["rating", "comment"];
const ORDER_COLUMNS: &[&str] = &["created_at", "updated_at", "rating"];

/// Request body for creating a review
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub business_id: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

/// Request body for updating a review
#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub id: String,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub attachments: Option<Vec<AttachmentInput>>,
}

/// Column filters for the review list
#[derive(Debug, Deserialize)]
pub struct ReviewListFilter {
    pub business_id: Option<String>,
    pub user_id: Option<String>,
}

/// Build the review router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_review))
        .route("/list", get(list_reviews))
        .route("/{id}", get(get_review))
        .route("/", put(update_review))
        .route("/{id}", delete(delete_review))
}

/// POST /v1/review - Create a review
///
/// The authenticated caller becomes the author; any user id in the body is
/// ignored.
async fn create_review(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let review = state
        .review_service
        .create(CreateReviewInput {
            business_id: body.business_id,
            user_id: identity.user_id,
            rating: body.rating,
            comment: body.comment,
            attachments: body.attachments,
        })
        .await
        .map_err(map_review_error)?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /v1/review/list - List reviews
async fn list_reviews(
    State(state): State<AppState>,
    Query(filter): Query<ReviewListFilter>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Review>>, ApiError> {
    let mut params = query.into_params(SEARCH_COLUMNS, ORDER_COLUMNS);
    if let Some(business_id) = filter.business_id {
        params = params.with_filter(Filter::eq("business_id", business_id));
    }
    if let Some(user_id) = filter.user_id {
        params = params.with_filter(Filter::eq("user_id", user_id));
    }

    let result = state
        .review_service
        .get_list(&params)
        .await
        .map_err(map_review_error)?;

    Ok(Json(result.into()))
}

/// GET /v1/review/{id} - Get one review with its attachments
async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Review>, ApiError> {
    let review = state
        .review_service
        .get(&id)
        .await
        .map_err(map_review_error)?;

    Ok(Json(review))
}

/// PUT /v1/review - Update a review
async fn update_review(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Json(body): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let is_admin = identity.is_admin();
    let review = state
        .review_service
        .update(
            &body.id,
            UpdateReviewInput {
                rating: body.rating,
                comment: body.comment,
                attachments: body.attachments,
            },
            &identity.user_id,
            is_admin,
        )
        .await
        .map_err(map_review_error)?;

    Ok(Json(review))
}

/// DELETE /v1/review/{id} - Delete a review
async fn delete_review(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let is_admin = identity.is_admin();
    state
        .review_service
        .delete(&id, &identity.user_id, is_admin)
        .await
        .map_err(map_review_error)?;

    Ok(Json(MessageResponse::new("Review deleted successfully")))
}

fn map_review_error(e: ReviewServiceError) -> ApiError {
    match e {
        ReviewServiceError::NotFound => ApiError::not_found(e.to_string()),
        ReviewServiceError::AccessDenied => ApiError::forbidden(e.to_string()),
        ReviewServiceError::InternalError(_) => ApiError::internal_error(e.to_string()),
    }
}
