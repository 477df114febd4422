//! Authentication and authorization middleware.
//!
//! Every route under `/v1` passes through [`authorize`]: the caller's role
//! is resolved from the Authorization header and checked against the policy
//! table for the matched route pattern. Handlers that need the caller pull
//! an [`AuthIdentity`] out of the request extensions.

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::DynDatabasePool;
use crate::services::{
    AuthService, BusinessService, CategoryService, PolicyEnforcer, ReviewService, SessionService,
    TokenService, UserService,
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub session_service: Arc<SessionService>,
    pub business_service: Arc<BusinessService>,
    pub category_service: Arc<CategoryService>,
    pub review_service: Arc<ReviewService>,
    pub token_service: Arc<TokenService>,
    pub policy: Arc<PolicyEnforcer>,
}

/// Caller identity carried by a verified access token
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: String,
    pub role: String,
    pub user_type: String,
}

impl AuthIdentity {
    /// Whether the caller holds a staff account
    pub fn is_admin(&self) -> bool {
        self.user_type == "admin"
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthIdentity>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Error response for API errors
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// Pull the access token out of the Authorization header.
///
/// The header value is the token itself; a conventional `Bearer ` prefix is
/// tolerated and stripped.
fn access_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Authorization middleware
///
/// Requests without a valid token run under the empty role, which the
/// default policy table only admits to the public endpoints. A denied
/// request maps to 401 when anonymous and 403 when authenticated.
///
/// The check runs against the matched route pattern (`/v1/business/{id}`),
/// not the concrete request path, so policy paths stay aligned with the
/// route table.
pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = access_token(request.headers())
        .and_then(|token| state.token_service.verify(token).ok())
        .map(|claims| AuthIdentity {
            user_id: claims.user_id,
            role: claims.role,
            user_type: claims.user_type,
        });

    let role = identity.as_ref().map(|i| i.role.as_str()).unwrap_or("");
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().as_str().to_string();

    if !state.policy.enforce(role, &path, &method) {
        return Err(match identity {
            Some(_) => ApiError::forbidden("Access denied"),
            None => ApiError::unauthorized("Authentication required"),
        });
    }

    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_access_token_raw() {
        let headers = headers_with_auth("raw-token-123");
        assert_eq!(access_token(&headers), Some("raw-token-123"));
    }

    #[test]
    fn test_access_token_bearer_prefix_stripped() {
        let headers = headers_with_auth("Bearer some-token");
        assert_eq!(access_token(&headers), Some("some-token"));
    }

    #[test]
    fn test_access_token_missing_header() {
        assert!(access_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_access_token_empty_value() {
        assert!(access_token(&headers_with_auth("")).is_none());
        assert!(access_token(&headers_with_auth("Bearer ")).is_none());
        assert!(access_token(&headers_with_auth("   ")).is_none());
    }

    #[test]
    fn test_api_error_statuses() {
        assert_eq!(ApiError::bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status, StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status, StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal_error("x").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_identity_is_admin() {
        let admin = AuthIdentity {
            user_id: "u1".to_string(),
            role: "super_admin".to_string(),
            user_type: "admin".to_string(),
        };
        let user = AuthIdentity {
            user_id: "u2".to_string(),
            role: "user".to_string(),
            user_type: "user".to_string(),
        };

        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }
}
