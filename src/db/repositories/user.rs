//! User repository
//!
//! Database operations for user accounts.
//!
//! Besides plain CRUD this module owns the sign-in transaction: activating
//! the account row and recording the new session are committed atomically so
//! a failed session insert never leaves a half-signed-in user.

use crate::config::DatabaseDriver;
use crate::db::query::build_list_query;
use crate::db::DynDatabasePool;
use crate::models::{Gender, ListParams, Session, User, UserRole, UserStatus, UserType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const USER_COLUMNS: &str = "id, user_type, user_role, name, email, password_hash, bio, gender, \
     profile_picture, status, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Check whether an email address is already registered
    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// List users with pagination, filtering and ordering
    async fn get_list(&self, params: &ListParams) -> Result<(Vec<User>, i64)>;

    /// Update a user (full row) and return the stored record
    async fn update(&self, user: &User) -> Result<User>;

    /// Replace the password hash for the account with this email
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()>;

    /// Delete a user
    async fn delete(&self, id: &str) -> Result<()>;

    /// Activate the account and record a session in one transaction.
    ///
    /// With `single_session` set, prior sessions of the user are removed
    /// before the new one is inserted.
    async fn sign_in(&self, email: &str, session: &Session, single_session: bool) -> Result<()>;
}

/// SQLx-based user repository implementation
///
/// Dispatches on the pool driver, so one type covers SQLite and MySQL.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Box the repository for handing to the service layer
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await
            }
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                email_exists_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => email_exists_mysql(self.pool.as_mysql().unwrap(), email).await,
        }
    }

    async fn get_list(&self, params: &ListParams) -> Result<(Vec<User>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_users_sqlite(self.pool.as_sqlite().unwrap(), params).await
            }
            DatabaseDriver::Mysql => list_users_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_user_sqlite(self.pool.as_sqlite().unwrap(), user).await
            }
            DatabaseDriver::Mysql => update_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_password_sqlite(self.pool.as_sqlite().unwrap(), email, password_hash).await
            }
            DatabaseDriver::Mysql => {
                update_password_mysql(self.pool.as_mysql().unwrap(), email, password_hash).await
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_user_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_user_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn sign_in(&self, email: &str, session: &Session, single_session: bool) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sign_in_sqlite(self.pool.as_sqlite().unwrap(), email, session, single_session).await
            }
            DatabaseDriver::Mysql => {
                sign_in_mysql(self.pool.as_mysql().unwrap(), email, session, single_session).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let type_str = user.user_type.to_string();
    let role_str = user.role.to_string();
    let gender_str = user.gender.to_string();
    let status_str = user.status.to_string();

    sqlx::query(
        r#"
        INSERT INTO users (id, user_type, user_role, name, email, password_hash, bio, gender,
                           profile_picture, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&type_str)
    .bind(&role_str)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&gender_str)
    .bind(&user.profile_picture)
    .bind(&status_str)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(user.clone())
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_type, user_role, name, email, password_hash, bio, gender,
               profile_picture, status, created_at, updated_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_type, user_role, name, email, password_hash, bio, gender,
               profile_picture, status, created_at, updated_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn email_exists_sqlite(pool: &SqlitePool, email: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(1) as count FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .context("Failed to check email")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn list_users_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<(Vec<User>, i64)> {
    let query = build_list_query("users", USER_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select.fetch_all(pool).await.context("Failed to list users")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_sqlite(&row)?);
    }

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count.fetch_one(pool).await.context("Failed to count users")?;
    let total: i64 = row.get("count");

    Ok((users, total))
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let type_str = user.user_type.to_string();
    let role_str = user.role.to_string();
    let gender_str = user.gender.to_string();
    let status_str = user.status.to_string();

    sqlx::query(
        r#"
        UPDATE users
        SET user_type = ?, user_role = ?, name = ?, email = ?, password_hash = ?, bio = ?,
            gender = ?, profile_picture = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&type_str)
    .bind(&role_str)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&gender_str)
    .bind(&user.profile_picture)
    .bind(&status_str)
    .bind(now)
    .bind(&user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_by_id_sqlite(pool, &user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn update_password_sqlite(pool: &SqlitePool, email: &str, password_hash: &str) -> Result<()> {
    let now = Utc::now();

    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE email = ?")
        .bind(password_hash)
        .bind(now)
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to update password")?;

    Ok(())
}

async fn delete_user_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

async fn sign_in_sqlite(
    pool: &SqlitePool,
    email: &str,
    session: &Session,
    single_session: bool,
) -> Result<()> {
    let now = Utc::now();
    let status_str = UserStatus::Active.to_string();
    let platform_str = session.platform.to_string();

    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin sign-in transaction")?;

    sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE email = ?")
        .bind(&status_str)
        .bind(now)
        .bind(email)
        .execute(&mut *tx)
        .await
        .context("Failed to activate user")?;

    if single_session {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(&session.user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear previous sessions")?;
    }

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
    .execute(&mut *tx)
    .await
    .context("Failed to record session")?;

    tx.commit()
        .await
        .context("Failed to commit sign-in transaction")?;

    Ok(())
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let type_str: String = row.get("user_type");
    let user_type = UserType::from_str(&type_str)
        .with_context(|| format!("Invalid user type in database: {}", type_str))?;

    let role_str: String = row.get("user_role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid user role in database: {}", role_str))?;

    let gender_str: String = row.get("gender");
    let gender = Gender::from_str(&gender_str)
        .with_context(|| format!("Invalid gender in database: {}", gender_str))?;

    let status_str: String = row.get("status");
    let status = UserStatus::from_str(&status_str)
        .with_context(|| format!("Invalid user status in database: {}", status_str))?;

    Ok(User {
        id: row.get("id"),
        user_type,
        role,
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        bio: row.get("bio"),
        gender,
        profile_picture: row.get("profile_picture"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let type_str = user.user_type.to_string();
    let role_str = user.role.to_string();
    let gender_str = user.gender.to_string();
    let status_str = user.status.to_string();

    sqlx::query(
        r#"
        INSERT INTO users (id, user_type, user_role, name, email, password_hash, bio, gender,
                           profile_picture, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&type_str)
    .bind(&role_str)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&gender_str)
    .bind(&user.profile_picture)
    .bind(&status_str)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(user.clone())
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_type, user_role, name, email, password_hash, bio, gender,
               profile_picture, status, created_at, updated_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_type, user_role, name, email, password_hash, bio, gender,
               profile_picture, status, created_at, updated_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn email_exists_mysql(pool: &MySqlPool, email: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(1) as count FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .context("Failed to check email")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn list_users_mysql(pool: &MySqlPool, params: &ListParams) -> Result<(Vec<User>, i64)> {
    let query = build_list_query("users", USER_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select.fetch_all(pool).await.context("Failed to list users")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_mysql(&row)?);
    }

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count.fetch_one(pool).await.context("Failed to count users")?;
    let total: i64 = row.get("count");

    Ok((users, total))
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    let type_str = user.user_type.to_string();
    let role_str = user.role.to_string();
    let gender_str = user.gender.to_string();
    let status_str = user.status.to_string();

    sqlx::query(
        r#"
        UPDATE users
        SET user_type = ?, user_role = ?, name = ?, email = ?, password_hash = ?, bio = ?,
            gender = ?, profile_picture = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&type_str)
    .bind(&role_str)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&gender_str)
    .bind(&user.profile_picture)
    .bind(&status_str)
    .bind(now)
    .bind(&user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_by_id_mysql(pool, &user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn update_password_mysql(pool: &MySqlPool, email: &str, password_hash: &str) -> Result<()> {
    let now = Utc::now();

    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE email = ?")
        .bind(password_hash)
        .bind(now)
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to update password")?;

    Ok(())
}

async fn delete_user_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

async fn sign_in_mysql(
    pool: &MySqlPool,
    email: &str,
    session: &Session,
    single_session: bool,
) -> Result<()> {
    let now = Utc::now();
    let status_str = UserStatus::Active.to_string();
    let platform_str = session.platform.to_string();

    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin sign-in transaction")?;

    sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE email = ?")
        .bind(&status_str)
        .bind(now)
        .bind(email)
        .execute(&mut *tx)
        .await
        .context("Failed to activate user")?;

    if single_session {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(&session.user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear previous sessions")?;
    }

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
    .execute(&mut *tx)
    .await
    .context("Failed to record session")?;

    tx.commit()
        .await
        .context("Failed to commit sign-in transaction")?;

    Ok(())
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let type_str: String = row.get("user_type");
    let user_type = UserType::from_str(&type_str)
        .with_context(|| format!("Invalid user type in database: {}", type_str))?;

    let role_str: String = row.get("user_role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid user role in database: {}", role_str))?;

    let gender_str: String = row.get("gender");
    let gender = Gender::from_str(&gender_str)
        .with_context(|| format!("Invalid gender in database: {}", gender_str))?;

    let status_str: String = row.get("status");
    let status = UserStatus::from_str(&status_str)
        .with_context(|| format!("Invalid user status in database: {}", status_str))?;

    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Ok(User {
        id: row.get("id"),
        user_type,
        role,
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        bio: row.get("bio"),
        gender,
        profile_picture: row.get("profile_picture"),
        status,
        created_at,
        updated_at,
    })
}
