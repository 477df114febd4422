//! Database operations for sign-in sessions. Sessions are inserted by the
//! user repository's sign-in transaction; this module covers reading,
//! updating and revoking them.

use crate::config::DatabaseDriver;
use crate::db::query::build_list_query;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, Session, SessionPlatform};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const SESSION_COLUMNS: &str = "id, user_id, user_agent, platform, ip_address, created_at, updated_at";

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// List sessions with pagination, filtering and ordering
    async fn get_list(&self, params: &ListParams) -> Result<(Vec<Session>, i64)>;

    /// Update a session (full row) and return the stored record
    async fn update(&self, session: &Session) -> Result<Session>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: &str) -> Result<()>;
}

/// SQLx-based session repository implementation
///
/// Dispatches on the pool driver, so one type covers SQLite and MySQL.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Box the repository for handing to the service layer
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_session_sqlite(self.pool.as_sqlite().unwrap(), session).await
            }
            DatabaseDriver::Mysql => {
                create_session_mysql(self.pool.as_mysql().unwrap(), session).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_session_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_session_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_list(&self, params: &ListParams) -> Result<(Vec<Session>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sessions_sqlite(self.pool.as_sqlite().unwrap(), params).await
            }
            DatabaseDriver::Mysql => {
                list_sessions_mysql(self.pool.as_mysql().unwrap(), params).await
            }
        }
    }

    async fn update(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_session_sqlite(self.pool.as_sqlite().unwrap(), session).await
            }
            DatabaseDriver::Mysql => {
                update_session_mysql(self.pool.as_mysql().unwrap(), session).await
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_session_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_session_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_sessions_by_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                delete_sessions_by_user_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    let platform_str = session.platform.to_string();

    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, user_agent, platform, ip_address, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(&session.user_agent)
    .bind(&platform_str)
    .bind(&session.ip_address)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, user_agent, platform, ip_address, created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_session_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_sessions_sqlite(
    pool: &SqlitePool,
    params: &ListParams,
) -> Result<(Vec<Session>, i64)> {
    let query = build_list_query("sessions", SESSION_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select
        .fetch_all(pool)
        .await
        .context("Failed to list sessions")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_sqlite(&row)?);
    }

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count
        .fetch_one(pool)
        .await
        .context("Failed to count sessions")?;
    let total: i64 = row.get("count");

    Ok((sessions, total))
}

async fn update_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    let now = Utc::now();
    let platform_str = session.platform.to_string();

    sqlx::query(
        r#"
        UPDATE sessions
        SET user_agent = ?, platform = ?, ip_address = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&session.user_agent)
    .bind(&platform_str)
    .bind(&session.ip_address)
    .bind(now)
    .bind(&session.id)
    .execute(pool)
    .await
    .context("Failed to update session")?;

    get_session_by_id_sqlite(pool, &session.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Session not found after update"))
}

async fn delete_session_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn delete_sessions_by_user_sqlite(pool: &SqlitePool, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete sessions by user")?;

    Ok(())
}

fn row_to_session_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    let platform_str: String = row.get("platform");
    let platform = SessionPlatform::from_str(&platform_str)
        .with_context(|| format!("Invalid session platform in database: {}", platform_str))?;

    Ok(Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        user_agent: row.get("user_agent"),
        platform,
        ip_address: row.get("ip_address"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    let platform_str = session.platform.to_string();

    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, user_agent, platform, ip_address, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(&session.user_agent)
    .bind(&platform_str)
    .bind(&session.ip_address)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, user_agent, platform, ip_address, created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_session_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_sessions_mysql(pool: &MySqlPool, params: &ListParams) -> Result<(Vec<Session>, i64)> {
    let query = build_list_query("sessions", SESSION_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select
        .fetch_all(pool)
        .await
        .context("Failed to list sessions")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_mysql(&row)?);
    }

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count
        .fetch_one(pool)
        .await
        .context("Failed to count sessions")?;
    let total: i64 = row.get("count");

    Ok((sessions, total))
}

async fn update_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    let now = Utc::now();
    let platform_str = session.platform.to_string();

    sqlx::query(
        r#"
        UPDATE sessions
        SET user_agent = ?, platform = ?, ip_address = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&session.user_agent)
    .bind(&platform_str)
    .bind(&session.ip_address)
    .bind(now)
    .bind(&session.id)
    .execute(pool)
    .await
    .context("Failed to update session")?;

    get_session_by_id_mysql(pool, &session.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Session not found after update"))
}

async fn delete_session_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn delete_sessions_by_user_mysql(pool: &MySqlPool, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete sessions by user")?;

    Ok(())
}

fn row_to_session_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Session> {
    let platform_str: String = row.get("platform");
    let platform = SessionPlatform::from_str(&platform_str)
        .with_context(|| format!("Invalid session platform in database: {}", platform_str))?;

    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Ok(Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        user_agent: row.get("user_agent"),
        platform,
        ip_address: row.get("ip_address"),
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::Filter;
    use uuid::Uuid;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxSessionRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxSessionRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_session(user_id: &str) -> Session {
        Session::new(
            user_id.to_string(),
            "Mozilla/5.0 test".to_string(),
            SessionPlatform::Web,
            "10.0.0.1".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_session() {
        let (_pool, repo) = setup_test_repo().await;

        let session = create_test_session("user-1");
        let created = repo
            .create(&session)
            .await
            .expect("Failed to create session");

        assert_eq!(created.id, session.id);
        assert_eq!(created.user_id, "user-1");
        assert_eq!(created.platform, SessionPlatform::Web);
    }

    #[tokio::test]
    async fn test_get_session_by_id() {
        let (_pool, repo) = setup_test_repo().await;

        let session = create_test_session("user-1");
        repo.create(&session)
            .await
            .expect("Failed to create session");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session")
            .expect("Session not found");

        assert_eq!(found.id, session.id);
        assert_eq!(found.user_agent, "Mozilla/5.0 test");
        assert_eq!(found.ip_address, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_get_session_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo
            .get_by_id(&Uuid::new_v4().to_string())
            .await
            .expect("Failed to get session");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_list_filters_by_user() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&create_test_session("user-1"))
            .await
            .expect("Failed to create session");
        repo.create(&create_test_session("user-1"))
            .await
            .expect("Failed to create session");
        repo.create(&create_test_session("user-2"))
            .await
            .expect("Failed to create session");

        let params = ListParams::new(1, 10).with_filter(Filter::eq("user_id", "user-1"));
        let (sessions, total) = repo
            .get_list(&params)
            .await
            .expect("Failed to list sessions");

        assert_eq!(total, 2);
        assert!(sessions.iter().all(|s| s.user_id == "user-1"));
    }

    #[tokio::test]
    async fn test_update_session() {
        let (_pool, repo) = setup_test_repo().await;

        let session = create_test_session("user-1");
        repo.create(&session)
            .await
            .expect("Failed to create session");

        let mut updated = session.clone();
        updated.user_agent = "Updated agent".to_string();
        updated.platform = SessionPlatform::Mobile;

        let stored = repo
            .update(&updated)
            .await
            .expect("Failed to update session");

        assert_eq!(stored.user_agent, "Updated agent");
        assert_eq!(stored.platform, SessionPlatform::Mobile);
        assert_eq!(stored.user_id, "user-1");
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (_pool, repo) = setup_test_repo().await;

        let session = create_test_session("user-1");
        repo.create(&session)
            .await
            .expect("Failed to create session");

        repo.delete(&session.id)
            .await
            .expect("Failed to delete session");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_sessions_by_user() {
        let (_pool, repo) = setup_test_repo().await;

        let session1 = create_test_session("user-1");
        let session2 = create_test_session("user-1");
        let session3 = create_test_session("user-2");

        repo.create(&session1)
            .await
            .expect("Failed to create session");
        repo.create(&session2)
            .await
            .expect("Failed to create session");
        repo.create(&session3)
            .await
            .expect("Failed to create session");

        repo.delete_by_user("user-1")
            .await
            .expect("Failed to delete sessions by user");

        assert!(repo.get_by_id(&session1.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&session2.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&session3.id).await.unwrap().is_some());
    }
}
