//! JWT token service
//!
//! Issues and verifies the HS256 bearer tokens handed out at sign-in.
//! Claims carry the user's id, email, role and account type so the
//! authorization middleware can evaluate policy without touching the
//! database on every request.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::models::User;

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id
    pub user_id: String,
    /// Email at issue time
    pub email: String,
    /// Role string consumed by the policy enforcer
    pub role: String,
    /// Account type (user, admin, business_owner)
    #[serde(rename = "type")]
    pub user_type: String,
    /// Expiry as a unix timestamp
    pub exp: usize,
}

/// Error types for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenServiceError {
    /// Token was valid once but its expiry has passed
    #[error("Token expired")]
    Expired,

    /// Token is malformed, unsigned, or signed with another key
    #[error("Invalid token")]
    Invalid,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Token service issuing and verifying HS256 JWTs
pub struct TokenService {
    secret: String,
    expiry_hours: i64,
}

impl TokenService {
    /// Create a token service from JWT configuration
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            expiry_hours: config.expiry_hours,
        }
    }

    /// Issue a signed token for `user`
    ///
    /// # Errors
    ///
    /// - `InternalError` if signing fails
    pub fn issue(&self, user: &User) -> Result<String, TokenServiceError> {
        let expires_at = Utc::now() + Duration::hours(self.expiry_hours);
        let claims = Claims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            user_type: user.user_type.to_string(),
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")?;

        Ok(token)
    }

    /// Verify a token string and return its claims
    ///
    /// # Errors
    ///
    /// - `Expired` if the token's expiry has passed
    /// - `Invalid` for any other verification failure
    pub fn verify(&self, token: &str) -> Result<Claims, TokenServiceError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => TokenServiceError::Expired,
            _ => TokenServiceError::Invalid,
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    fn test_config(secret: &str, expiry_hours: i64) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            expiry_hours,
        }
    }

    fn test_user() -> User {
        User::new(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "hash".to_string(),
            Gender::Female,
        )
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let service = TokenService::new(&test_config("test-secret", 24));
        let user = test_user();

        let token = service.issue(&user).expect("Failed to issue token");
        let claims = service.verify(&token).expect("Failed to verify token");

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.user_type, "user");
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_claims_serialize_type_key() {
        // The account type travels under the short "type" key
        let claims = Claims {
            user_id: "u-1".to_string(),
            email: "a@b.c".to_string(),
            role: "admin".to_string(),
            user_type: "admin".to_string(),
            exp: 0,
        };

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "admin");
        assert!(json.get("user_type").is_none());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let issuer = TokenService::new(&test_config("secret-a", 24));
        let verifier = TokenService::new(&test_config("secret-b", 24));

        let token = issuer.issue(&test_user()).expect("Failed to issue token");
        let result = verifier.verify(&token);

        assert!(matches!(result, Err(TokenServiceError::Invalid)));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let service = TokenService::new(&test_config("test-secret", 24));

        assert!(matches!(
            service.verify("not-a-token"),
            Err(TokenServiceError::Invalid)
        ));
        assert!(matches!(
            service.verify(""),
            Err(TokenServiceError::Invalid)
        ));
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        let service = TokenService::new(&test_config("test-secret", 24));
        let token = service.issue(&test_user()).expect("Failed to issue token");

        let mut tampered = token.clone();
        tampered.replace_range(token.len() - 4.., "AAAA");
        let result = service.verify(&tampered);

        assert!(matches!(result, Err(TokenServiceError::Invalid)));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // Issued an hour in the past, well beyond the default leeway
        let service = TokenService::new(&test_config("test-secret", -1));
        let token = service.issue(&test_user()).expect("Failed to issue token");

        let result = service.verify(&token);

        assert!(matches!(result, Err(TokenServiceError::Expired)));
    }
}
