//! Authentication service
//!
//! Implements the account lifecycle around sign-up, sign-in, verification
//! codes, password recovery, and logout:
//! - Sign-up creates an unverified account with a hashed password
//! - Sign-in checks credentials, activates the account, records a session,
//!   and returns a signed JWT
//! - Password updates are authorized by an emailed verification code
//! - Logout removes every session belonging to the caller

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, SessionPlatform, User};
use crate::services::password::{hash_password, validate_password, verify_password, PasswordPolicyError};
use crate::services::token::TokenService;
use crate::services::verification::VerificationService;

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// An account with this email already exists
    #[error("user with this email already exists")]
    EmailExists,

    /// New password rejected by the strength policy
    #[error("{0}")]
    WeakPassword(#[from] PasswordPolicyError),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No account for this email
    #[error("user not found")]
    UserNotFound,

    /// Wrong password at sign-in
    #[error("incorrect password")]
    InvalidCredentials,

    /// Account has been blocked by an administrator
    #[error("Account is blocked")]
    AccountBlocked,

    /// Submitted verification code is missing, expired, or wrong
    #[error("Invalid verification code")]
    InvalidVerificationCode,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Authentication service for sign-up, sign-in, and password recovery
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    tokens: Arc<TokenService>,
    verification: VerificationService,
    single_session: bool,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        tokens: Arc<TokenService>,
        verification: VerificationService,
        single_session: bool,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            tokens,
            verification,
            single_session,
        }
    }

    /// Register a new account
    ///
    /// The account starts in the unverified state with the default user
    /// role; sign-in later activates it.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if name or email is empty or the email is malformed
    /// - `EmailExists` if the email is already registered
    /// - `WeakPassword` if the password fails the strength policy
    /// - `InternalError` for database errors
    pub async fn sign_up(&self, input: CreateUserInput) -> Result<User, AuthServiceError> {
        self.validate_sign_up_input(&input)?;

        if self
            .user_repo
            .email_exists(&input.email)
            .await
            .context("Failed to check email")?
        {
            return Err(AuthServiceError::EmailExists);
        }

        validate_password(&input.password)?;

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = User::new(input.name, input.email, password_hash, input.gender);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        Ok(created)
    }

    /// Sign in with email and password
    ///
    /// On success the account is activated, a session row is recorded for
    /// the device, and a signed token is returned. With single-session
    /// enabled the new session replaces any previous ones.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no account exists for the email
    /// - `AccountBlocked` if the account has been blocked
    /// - `InvalidCredentials` if the password is wrong
    /// - `InternalError` for database errors
    pub async fn sign_in(&self, input: SignInInput) -> Result<String, AuthServiceError> {
        let user = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to get user by email")?
            .ok_or(AuthServiceError::UserNotFound)?;

        if user.is_blocked() {
            return Err(AuthServiceError::AccountBlocked);
        }

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let session = Session::new(
            user.id.clone(),
            input.user_agent,
            input.platform,
            input.ip_address,
        );

        self.user_repo
            .sign_in(&input.email, &session, self.single_session)
            .await
            .context("Failed to record sign-in")?;

        let token = self.tokens.issue(&user).context("Failed to issue token")?;

        Ok(token)
    }

    /// Email a verification code to an existing account
    ///
    /// Returns how long the code stays valid so callers can surface it.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no account exists for the email
    /// - `InternalError` if delivery or caching fails
    pub async fn send_verification_code(
        &self,
        email: &str,
    ) -> Result<std::time::Duration, AuthServiceError> {
        let exists = self
            .user_repo
            .email_exists(email)
            .await
            .context("Failed to check email")?;
        if !exists {
            return Err(AuthServiceError::UserNotFound);
        }

        self.verification.send_code(email).await?;

        Ok(self.verification.ttl())
    }

    /// Update an account's password, authorized by a verification code
    ///
    /// # Errors
    ///
    /// - `InvalidVerificationCode` if the code is missing, expired, or wrong
    /// - `WeakPassword` if the new password fails the strength policy
    /// - `InternalError` for database errors
    pub async fn update_password(&self, input: UpdatePasswordInput) -> Result<(), AuthServiceError> {
        let verified = self
            .verification
            .verify_code(&input.email, input.code)
            .await?;
        if !verified {
            return Err(AuthServiceError::InvalidVerificationCode);
        }

        validate_password(&input.new_password)?;

        let password_hash =
            hash_password(&input.new_password).context("Failed to hash password")?;

        self.user_repo
            .update_password(&input.email, &password_hash)
            .await
            .context("Failed to update password")?;

        Ok(())
    }

    /// Log out a user by removing all of their sessions
    ///
    /// Tokens carry no session id, so logout clears every session the
    /// user holds.
    pub async fn logout(&self, user_id: &str) -> Result<(), AuthServiceError> {
        self.session_repo
            .delete_by_user(user_id)
            .await
            .context("Failed to delete sessions")?;

        Ok(())
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    /// Validate sign-up input
    fn validate_sign_up_input(&self, input: &CreateUserInput) -> Result<(), AuthServiceError> {
        if input.name.trim().is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        if input.email.trim().is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }

        // Basic email format validation
        if !input.email.contains('@') {
            return Err(AuthServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        Ok(())
    }
}

/// Input for signing in
#[derive(Debug, Clone)]
pub struct SignInInput {
    /// Account email
    pub email: String,
    /// Plaintext password
    pub password: String,
    /// Device user agent
    pub user_agent: String,
    /// Client platform
    pub platform: SessionPlatform,
    /// Client IP address
    pub ip_address: String,
}

impl SignInInput {
    /// Create new sign-in input
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        user_agent: impl Into<String>,
        platform: SessionPlatform,
        ip_address: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            user_agent: user_agent.into(),
            platform,
            ip_address: ip_address.into(),
        }
    }
}

/// Input for updating a password with a verification code
#[derive(Debug, Clone)]
pub struct UpdatePasswordInput {
    /// Account email
    pub email: String,
    /// Verification code previously emailed to the account
    pub code: u32,
    /// Replacement password
    pub new_password: String,
}

impl UpdatePasswordInput {
    /// Create new update-password input
    pub fn new(email: impl Into<String>, code: u32, new_password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            code,
            new_password: new_password.into(),
        }
    }
}
