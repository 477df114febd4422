//! Connection pool abstraction over the supported database drivers.
//!
//! Repositories never hold a concrete pool type. They receive a
//! [`DynDatabasePool`], branch on [`DatabasePool::driver`] and reach the
//! typed sqlx pool through `as_sqlite()` / `as_mysql()`. Everything that
//! is driver-independent (health checks, raw statements, shutdown) goes
//! through the trait itself.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

const SQLITE_MAX_CONNECTIONS: u32 = 20;
const MYSQL_MAX_CONNECTIONS: u32 = 30;

/// Backend-independent view of a connection pool.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a statement that returns no rows, yielding the affected count
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Verify the database answers queries
    async fn ping(&self) -> Result<()>;

    /// Close all connections
    async fn close(&self);

    /// Which driver this pool talks to
    fn driver(&self) -> DatabaseDriver;

    /// Typed SQLite pool, `None` for other drivers
    fn as_sqlite(&self) -> Option<&SqlitePool>;

    /// Typed MySQL pool, `None` for other drivers
    fn as_mysql(&self) -> Option<&MySqlPool>;
}

/// Shared handle to a driver-selected pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Normalize a configured SQLite location into a sqlx connection URL.
///
/// Accepts `:memory:`, bare file paths, and full `sqlite:` URLs. File
/// databases get `mode=rwc` appended so a missing file is created on
/// first open; URLs that already carry options are left untouched.
fn sqlite_connect_url(url: &str) -> String {
    if url == ":memory:" || url == "sqlite::memory:" {
        return "sqlite::memory:".to_string();
    }
    if let Some(rest) = url.strip_prefix("sqlite:") {
        if rest.contains('?') {
            return url.to_string();
        }
        return format!("sqlite:{}?mode=rwc", rest);
    }
    format!("sqlite:{}?mode=rwc", url)
}

/// File path of a SQLite location, `None` for in-memory databases.
fn sqlite_file_path(url: &str) -> Option<&str> {
    if url == ":memory:" || url == "sqlite::memory:" {
        return None;
    }
    Some(url.strip_prefix("sqlite:").unwrap_or(url))
}

/// Pool for a SQLite database, in-memory or file-backed.
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if necessary) the database at `url`.
    pub async fn new(url: &str) -> Result<Self> {
        // mode=rwc creates the file but not its directory.
        if let Some(path) = sqlite_file_path(url) {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .connect(&sqlite_connect_url(url))
            .await
            .with_context(|| format!("Failed to open SQLite database: {}", url))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let done = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", query))?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("SQLite ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

/// Pool for a MySQL server.
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Connect to the server at `url`; a bare `user:pass@host/db` form
    /// is accepted and prefixed with the scheme.
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(MYSQL_MAX_CONNECTIONS)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let done = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", query))?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("MySQL ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

/// Build the pool the configuration asks for.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or reached.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let pool: DynDatabasePool = match config.driver {
        DatabaseDriver::Sqlite => Arc::new(SqliteDatabase::new(&config.url).await?),
        DatabaseDriver::Mysql => Arc::new(MysqlDatabase::new(&config.url).await?),
    };
    Ok(pool)
}

/// In-memory SQLite pool for tests.
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let config = DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}
