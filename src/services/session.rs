//! Session management service
//!
//! Read, update, and delete over the session rows recorded at sign-in.
//! Sessions are never created here; the auth service writes them as part
//! of the sign-in transaction.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::SessionRepository;
use crate::models::{ListParams, PagedResult, Session, UpdateSessionInput};

/// Error types for session management operations
#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    /// No session with the given id
    #[error("Session not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Session management service
pub struct SessionService {
    session_repo: Arc<dyn SessionRepository>,
}

impl SessionService {
    /// Create a new session service
    pub fn new(session_repo: Arc<dyn SessionRepository>) -> Self {
        Self { session_repo }
    }

    /// Fetch a session by id
    ///
    /// # Errors
    ///
    /// - `NotFound` if no session has the id
    pub async fn get(&self, id: &str) -> Result<Session, SessionServiceError> {
        self.session_repo
            .get_by_id(id)
            .await
            .context("Failed to get session")?
            .ok_or(SessionServiceError::NotFound)
    }

    /// List sessions with pagination, filtering, and ordering
    pub async fn get_list(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Session>, SessionServiceError> {
        let (sessions, total) = self
            .session_repo
            .get_list(params)
            .await
            .context("Failed to list sessions")?;

        Ok(PagedResult::new(sessions, total, params))
    }

    /// Apply a partial update to a session's device metadata
    ///
    /// # Errors
    ///
    /// - `NotFound` if no session has the id
    pub async fn update(
        &self,
        id: &str,
        input: UpdateSessionInput,
    ) -> Result<Session, SessionServiceError> {
        let mut session = self.get(id).await?;

        if let Some(user_agent) = input.user_agent {
            session.user_agent = user_agent;
        }
        if let Some(platform) = input.platform {
            session.platform = platform;
        }
        if let Some(ip_address) = input.ip_address {
            session.ip_address = ip_address;
        }
        session.updated_at = Utc::now();

        let updated = self
            .session_repo
            .update(&session)
            .await
            .context("Failed to update session")?;

        Ok(updated)
    }

    /// Delete a session by id
    ///
    /// # Errors
    ///
    /// - `NotFound` if no session has the id
    pub async fn delete(&self, id: &str) -> Result<(), SessionServiceError> {
        self.get(id).await?;

        self.session_repo
            .delete(id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }
}
