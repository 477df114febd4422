//! User management service
//!
//! Administrative CRUD over accounts: create, fetch, list with the shared
//! list-query parameters, partial update, and delete. Registration and
//! credential flows live in the auth service; this one backs the /v1/user
//! admin surface.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::UserRepository;
use crate::models::{CreateUserInput, ListParams, PagedResult, UpdateUserInput, User};
use crate::services::password::{hash_password, validate_password, PasswordPolicyError};

/// Error types for user management operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// No user with the given id
    #[error("User not found")]
    NotFound,

    /// An account with this email already exists
    #[error("user with this email already exists")]
    EmailExists,

    /// Password rejected by the strength policy
    #[error("{0}")]
    WeakPassword(#[from] PasswordPolicyError),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User management service
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    /// Create a new user service
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Create a user on behalf of an administrator
    ///
    /// Behaves like registration: the account starts unverified with the
    /// default role and a hashed password.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if name or email is empty or the email is malformed
    /// - `EmailExists` if the email is already registered
    /// - `WeakPassword` if the password fails the strength policy
    /// - `InternalError` for database errors
    pub async fn create(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        if input.name.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if self
            .user_repo
            .email_exists(&input.email)
            .await
            .context("Failed to check email")?
        {
            return Err(UserServiceError::EmailExists);
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

    /// Fetch a user by id
    ///
    /// # Errors
    ///
    /// - `NotFound` if no user has the id
    pub async fn get(&self, id: &str) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)
    }

    /// List users with pagination, filtering, and ordering
    pub async fn get_list(&self, params: &ListParams) -> Result<PagedResult<User>, UserServiceError> {
        let (users, total) = self
            .user_repo
            .get_list(params)
            .await
            .context("Failed to list users")?;

        Ok(PagedResult::new(users, total, params))
    }

    /// Apply a partial update to a user
    ///
    /// Only fields set in the input change; a new password is validated and
    /// hashed before it replaces the stored hash.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no user has the id
    /// - `EmailExists` if the new email belongs to another account
    /// - `WeakPassword` if the new password fails the strength policy
    /// - `InternalError` for database errors
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> Result<User, UserServiceError> {
        let mut user = self.get(id).await?;

        if let Some(email) = input.email {
            if email != user.email {
                if self
                    .user_repo
                    .email_exists(&email)
                    .await
                    .context("Failed to check email")?
                {
                    return Err(UserServiceError::EmailExists);
                }
                user.email = email;
            }
        }
        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(password) = input.password {
            validate_password(&password)?;
            user.password_hash =
                hash_password(&password).context("Failed to hash password")?;
        }
        if let Some(bio) = input.bio {
            user.bio = Some(bio);
        }
        if let Some(profile_picture) = input.profile_picture {
            user.profile_picture = Some(profile_picture);
        }
        if let Some(role) = input.role {
            user.role = role;
        }
        if let Some(user_type) = input.user_type {
            user.user_type = user_type;
        }
        if let Some(status) = input.status {
            user.status = status;
        }
        user.updated_at = Utc::now();

        let updated = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        Ok(updated)
    }

    /// Delete a user by id
    ///
    /// # Errors
    ///
    /// - `NotFound` if no user has the id
    pub async fn delete(&self, id: &str) -> Result<(), UserServiceError> {
        // Surface a not-found instead of silently deleting nothing
        self.get(id).await?;

        self.user_repo
            .delete(id)
            .await
            .context("Failed to delete user")?;

        Ok(())
    }
}
