//! Code-defined schema migrations.
//!
//! The schema ships inside the binary: each [`Migration`] pairs a version
//! number with the SQL to run on SQLite and on MySQL, and `_migrations`
//! records what has been applied so startup can run only the missing ones.
//!
//! No table declares a foreign key. Deleting a parent row leaves its
//! dependents in place (sessions, reviews, attachments), and the service
//! layer owns whatever cleanup applies.

use std::collections::HashSet;

use anyhow::{Context, Result};
use sqlx::{MySqlPool, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// One schema step, with SQL per supported driver.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Ordering key, unique and sequential from 1
    pub version: i32,
    /// Short name recorded in `_migrations`
    pub name: &'static str,
    /// Statements for SQLite
    pub up_sqlite: &'static str,
    /// Statements for MySQL
    pub up_mysql: &'static str,
}

/// Every migration, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(36) PRIMARY KEY,
                user_type VARCHAR(20) NOT NULL DEFAULT 'user',
                user_role VARCHAR(20) NOT NULL DEFAULT 'user',
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                bio TEXT,
                gender VARCHAR(10) NOT NULL DEFAULT 'male',
                profile_picture VARCHAR(500),
                status VARCHAR(20) NOT NULL DEFAULT 'inverify',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            CREATE INDEX IF NOT EXISTS idx_users_status ON users(status);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(36) PRIMARY KEY,
                user_type VARCHAR(20) NOT NULL DEFAULT 'user',
                user_role VARCHAR(20) NOT NULL DEFAULT 'user',
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                bio TEXT,
                gender VARCHAR(10) NOT NULL DEFAULT 'male',
                profile_picture VARCHAR(500),
                status VARCHAR(20) NOT NULL DEFAULT 'inverify',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_email ON users(email);
            CREATE INDEX idx_users_status ON users(status);
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(36) PRIMARY KEY,
                user_id VARCHAR(36) NOT NULL,
                user_agent TEXT NOT NULL,
                platform VARCHAR(20) NOT NULL DEFAULT 'web',
                ip_address VARCHAR(45) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(36) PRIMARY KEY,
                user_id VARCHAR(36) NOT NULL,
                user_agent TEXT NOT NULL,
                platform VARCHAR(20) NOT NULL DEFAULT 'web',
                ip_address VARCHAR(45) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
        "#,
    },
    Migration {
        version: 3,
        name: "create_business_categories",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS business_categories (
                id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_business_categories_name ON business_categories(name);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS business_categories (
                id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_business_categories_name ON business_categories(name);
        "#,
    },
    Migration {
        version: 4,
        name: "create_businesses",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS businesses (
                id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                category_id VARCHAR(36) NOT NULL,
                address VARCHAR(500) NOT NULL,
                latitude REAL,
                longitude REAL,
                contact_info TEXT,
                hours_of_operation TEXT,
                owner_id VARCHAR(36) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_businesses_category_id ON businesses(category_id);
            CREATE INDEX IF NOT EXISTS idx_businesses_owner_id ON businesses(owner_id);
            CREATE INDEX IF NOT EXISTS idx_businesses_name ON businesses(name);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS businesses (
                id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                category_id VARCHAR(36) NOT NULL,
                address VARCHAR(500) NOT NULL,
                latitude DOUBLE,
                longitude DOUBLE,
                contact_info TEXT,
                hours_of_operation TEXT,
                owner_id VARCHAR(36) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_businesses_category_id ON businesses(category_id);
            CREATE INDEX idx_businesses_owner_id ON businesses(owner_id);
            CREATE INDEX idx_businesses_name ON businesses(name);
        "#,
    },
    Migration {
        version: 5,
        name: "create_business_attachments",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS business_attachments (
                id VARCHAR(36) PRIMARY KEY,
                business_id VARCHAR(36) NOT NULL,
                filepath VARCHAR(500) NOT NULL,
                content_type VARCHAR(10) NOT NULL DEFAULT 'photo',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_business_attachments_business_id ON business_attachments(business_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS business_attachments (
                id VARCHAR(36) PRIMARY KEY,
                business_id VARCHAR(36) NOT NULL,
                filepath VARCHAR(500) NOT NULL,
                content_type VARCHAR(10) NOT NULL DEFAULT 'photo',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_business_attachments_business_id ON business_attachments(business_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_reviews",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id VARCHAR(36) PRIMARY KEY,
                business_id VARCHAR(36) NOT NULL,
                user_id VARCHAR(36) NOT NULL,
                rating INTEGER NOT NULL DEFAULT 0,
                comment TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_reviews_business_id ON reviews(business_id);
            CREATE INDEX IF NOT EXISTS idx_reviews_user_id ON reviews(user_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id VARCHAR(36) PRIMARY KEY,
                business_id VARCHAR(36) NOT NULL,
                user_id VARCHAR(36) NOT NULL,
                rating TINYINT UNSIGNED NOT NULL DEFAULT 0,
                comment TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_reviews_business_id ON reviews(business_id);
            CREATE INDEX idx_reviews_user_id ON reviews(user_id);
        "#,
    },
    Migration {
        version: 7,
        name: "create_review_attachments",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS review_attachments (
                id VARCHAR(36) PRIMARY KEY,
                review_id VARCHAR(36) NOT NULL,
                filepath VARCHAR(500) NOT NULL,
                content_type VARCHAR(10) NOT NULL DEFAULT 'photo',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_review_attachments_review_id ON review_attachments(review_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS review_attachments (
                id VARCHAR(36) PRIMARY KEY,
                review_id VARCHAR(36) NOT NULL,
                filepath VARCHAR(500) NOT NULL,
                content_type VARCHAR(10) NOT NULL DEFAULT 'photo',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_review_attachments_review_id ON review_attachments(review_id);
        "#,
    },
];

/// Bring the schema up to date, returning how many migrations ran.
///
/// Creates the `_migrations` bookkeeping table on first use, then applies
/// every migration whose version is not yet recorded, in order.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied: HashSet<i32> = applied_versions(pool).await?.into_iter().collect();

    let mut count = 0;
    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(&m.version)) {
        tracing::info!("Applying migration {} ({})", migration.version, migration.name);
        apply_migration(pool, migration)
            .await
            .with_context(|| {
                format!("Migration {} ({}) failed", migration.version, migration.name)
            })?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("Schema already up to date");
    }

    Ok(count)
}

/// Whether every defined migration has been applied.
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    create_migrations_table(pool).await?;
    let applied = applied_versions(pool).await?;
    Ok(applied.len() == MIGRATIONS.len())
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let version_type = match pool.driver() {
        DatabaseDriver::Sqlite => "INTEGER",
        DatabaseDriver::Mysql => "INT",
    };

    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version {} PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        version_type
    );

    pool.execute(&sql)
        .await
        .context("Failed to create migrations table")?;
    Ok(())
}

async fn applied_versions(pool: &DynDatabasePool) -> Result<Vec<i32>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            let sqlite = pool
                .as_sqlite()
                .context("SQLite driver without SQLite pool")?;
            applied_versions_sqlite(sqlite).await
        }
        DatabaseDriver::Mysql => {
            let mysql = pool.as_mysql().context("MySQL driver without MySQL pool")?;
            applied_versions_mysql(mysql).await
        }
    }
}

async fn applied_versions_sqlite(pool: &SqlitePool) -> Result<Vec<i32>> {
    sqlx::query_scalar::<_, i32>("SELECT version FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")
}

async fn applied_versions_mysql(pool: &MySqlPool) -> Result<Vec<i32>> {
    sqlx::query_scalar::<_, i32>("SELECT version FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            let sqlite = pool
                .as_sqlite()
                .context("SQLite driver without SQLite pool")?;
            apply_migration_sqlite(sqlite, migration).await
        }
        DatabaseDriver::Mysql => {
            let mysql = pool.as_mysql().context("MySQL driver without MySQL pool")?;
            apply_migration_mysql(mysql, migration).await
        }
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Statement failed: {}", sql_snippet(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await
        .context("Failed to record migration")?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Statement failed: {}", sql_snippet(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await
        .context("Failed to record migration")?;

    Ok(())
}

/// Split a migration body into executable statements.
///
/// sqlx runs one statement per query, so multi-statement bodies are split
/// on `;`. None of the embedded SQL contains a literal semicolon.
fn split_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !comment_only(stmt))
        .collect()
}

fn comment_only(stmt: &str) -> bool {
    stmt.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Single-line head of a statement, for error context.
fn sql_snippet(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() > 80 {
        format!("{}...", &flat[..80])
    } else {
        flat
    }
}
