//! Business API endpoints
//!
//! Handles HTTP requests for business listings and their photo/video
//! attachments:
//! - POST /v1/business - Create a listing (owner taken from the caller)
//! - GET /v1/business/list - List businesses
//! - GET /v1/business/{id} - Get one business
//! - PUT /v1/business - Update a listing (id in body, owner or admin only)
//! - DELETE /v1/business/{id} - Delete a listing (owner or admin only)

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
use crate::models::{
    AttachmentInput, Business, ContactInfo, CreateBusinessInput, Filter, HoursOfOperation,
    UpdateBusinessInput,
};
use crate::services::business::BusinessServiceError;

const SEARCH_COLUMNS: &[&str] = &["name", "address", "description"];
const ORDER_COLUMNS: &[&str] = &["created_at", "updated_at", "name"];

/// Request body for creating a business
#[derive(Debug, Deserialize)]
pub struct CreateBusinessRequest {
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub contact_info: Option<ContactInfo>,
    pub hours_of_operation: Option<HoursOfOperation>,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

/// Request body for updating a business
#[derive(Debug, Deserialize)]
pub struct UpdateBusinessRequest {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub contact_info: Option<ContactInfo>,
    pub hours_of_operation: Option<HoursOfOperation>,
    pub attachments: Option<Vec<AttachmentInput>>,
}

/// Column filters for the business list
#[derive(Debug, Deserialize)]
pub struct BusinessListFilter {
    pub category_id: Option<String>,
    pub owner_id: Option<String>,
}

/// Build the business router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_business))
        .route("/list", get(list_businesses))
        .route("/{id}", get(get_business))
        .route("/", put(update_business))
        .route("/{id}", delete(delete_business))
}

/// POST /v1/business - Create a business listing
///
/// The authenticated caller becomes the owner; any owner id in the body is
/// ignored.
async fn create_business(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Json(body): Json<CreateBusinessRequest>,
) -> Result<(StatusCode, Json<Business>), ApiError> {
    let business = state
        .business_service
        .create(CreateBusinessInput {
            name: body.name,
            description: body.description,
            category_id: body.category_id,
            address: body.address,
            latitude: body.latitude,
            longitude: body.longitude,
            contact_info: body.contact_info,
            hours_of_operation: body.hours_of_operation,
            attachments: body.attachments,
            owner_id: identity.user_id,
        })
        .await
        .map_err(map_business_error)?;

    Ok((StatusCode::CREATED, Json(business)))
}

/// GET /v1/business/list - List businesses
async fn list_businesses(
    State(state): State<AppState>,
    Query(filter): Query<BusinessListFilter>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Business>>, ApiError> {
    let mut params = query.into_params(SEARCH_COLUMNS, ORDER_COLUMNS);
    if let Some(category_id) = filter.category_id {
        params = params.with_filter(Filter::eq("category_id", category_id));
    }
    if let Some(owner_id) = filter.owner_id {
        params = params.with_filter(Filter::eq("owner_id", owner_id));
    }

    let result = state
        .business_service
        .get_list(&params)
        .await
        .map_err(map_business_error)?;

    Ok(Json(result.into()))
}

/// GET /v1/business/{id} - Get one business with its attachments
async fn get_business(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Business>, ApiError> {
    let business = state
        .business_service
        .get(&id)
        .await
        .map_err(map_business_error)?;

    Ok(Json(business))
}

/// PUT /v1/business - Update a business listing
async fn update_business(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Json(body): Json<UpdateBusinessRequest>,
) -> Result<Json<Business>, ApiError> {
    let is_admin = identity.is_admin();
    let business = state
        .business_service
        .update(
            &body.id,
            UpdateBusinessInput {
                name: body.name,
                description: body.description,
                category_id: body.category_id,
                address: body.address,
                latitude: body.latitude,
                longitude: body.longitude,
                contact_info: body.contact_info,
                hours_of_operation: body.hours_of_operation,
                attachments: body.attachments,
            },
            &identity.user_id,
            is_admin,
        )
        .await
        .map_err(map_business_error)?;

    Ok(Json(business))
}

/// DELETE /v1/business/{id} - Delete a business listing
async fn delete_business(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let is_admin = identity.is_admin();
    state
        .business_service
        .delete(&id, &identity.user_id, is_admin)
        .await
        .map_err(map_business_error)?;

    Ok(Json(MessageResponse::new("Business deleted successfully")))
}

fn map_business_error(e: BusinessServiceError) -> ApiError {
    match e {
        BusinessServiceError::NotFound => ApiError::not_found(e.to_string()),
        BusinessServiceError::AccessDenied(_) => ApiError::forbidden(e.to_string()),
        BusinessServiceError::ValidationError(msg) => ApiError::bad_request(msg),
        BusinessServiceError::InternalError(_) => ApiError::internal_error(e.to_string()),
    }
}
