//! Account access endpoints:
//! - POST /v1/auth/sign-up - Register a new account
//! - POST /v1/auth/sign-in - Sign in and receive an access token
//! - POST /v1/auth/send-verification-code - Email a password-reset code
//! - POST /v1/auth/update-password - Set a new password with a valid code
//! - POST /v1/auth/logout - Remove the caller's sessions

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthIdentity};
use crate::api::responses::{MessageResponse, TokenResponse};
use crate::models::{CreateUserInput, Gender, SessionPlatform};
use crate::services::auth::{AuthServiceError, SignInInput, UpdatePasswordInput};

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub gender: Gender,
}

/// Request body for sign-in
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub platform: SessionPlatform,
}

/// Request body for requesting a verification code
#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

/// Request body for resetting a password with a verification code
///
/// The code arrives as a string to match what clients read back from the
/// email; non-numeric input counts as an invalid code.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Response for a sent verification code
#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub message: String,
    /// Code lifetime in seconds
    pub duration: u64,
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/send-verification-code", post(send_verification_code))
        .route("/update-password", post(update_password))
        .route("/logout", post(logout))
}

/// POST /v1/auth/sign-up - Register a new account
async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth_service
        .sign_up(CreateUserInput {
            name: body.name,
            email: body.email,
            password: body.password,
            gender: body.gender,
        })
        .await
        .map_err(|e| match e {
            AuthServiceError::EmailExists => ApiError::conflict(e.to_string()),
            AuthServiceError::ValidationError(msg) => ApiError::bad_request(msg),
            AuthServiceError::WeakPassword(_) => ApiError::bad_request(e.to_string()),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

/// POST /v1/auth/sign-in - Sign in and receive an access token
///
/// Unknown emails and wrong passwords produce the same 401 so the response
/// does not reveal which half was wrong.
async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SignInRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let ip_address = extract_ip_address(&headers).unwrap_or_default();

    let token = state
        .auth_service
        .sign_in(SignInInput::new(
            body.email,
            body.password,
            user_agent,
            body.platform,
            ip_address,
        ))
        .await
        .map_err(|e| match e {
            AuthServiceError::UserNotFound | AuthServiceError::InvalidCredentials => {
                ApiError::unauthorized("Incorrect email or password")
            }
            AuthServiceError::AccountBlocked => ApiError::forbidden(e.to_string()),
            AuthServiceError::ValidationError(msg) => ApiError::bad_request(msg),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok(Json(TokenResponse { token }))
}

/// POST /v1/auth/send-verification-code - Email a password-reset code
async fn send_verification_code(
    State(state): State<AppState>,
    Json(body): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, ApiError> {
    let ttl = state
        .auth_service
        .send_verification_code(&body.email)
        .await
        .map_err(|e| match e {
            AuthServiceError::UserNotFound => ApiError::not_found(e.to_string()),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok(Json(SendCodeResponse {
        message: "Verification code sent successfully".to_string(),
        duration: ttl.as_secs(),
    }))
}

/// POST /v1/auth/update-password - Set a new password with a valid code
async fn update_password(
    State(state): State<AppState>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let code: u32 = body
        .code
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid verification code"))?;

    state
        .auth_service
        .update_password(UpdatePasswordInput::new(body.email, code, body.new_password))
        .await
        .map_err(|e| match e {
            AuthServiceError::InvalidVerificationCode => ApiError::bad_request(e.to_string()),
            AuthServiceError::WeakPassword(_) => ApiError::bad_request(e.to_string()),
            AuthServiceError::ValidationError(msg) => ApiError::bad_request(msg),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok(Json(MessageResponse::new(
        "User password updated successfully",
    )))
}

/// POST /v1/auth/logout - Remove the caller's sessions
async fn logout(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth_service
        .logout(&identity.user_id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// Extract the client IP from proxy headers.
///
/// Checks X-Forwarded-For (first entry) then X-Real-IP.
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Some(ip.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}
