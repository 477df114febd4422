//! Business category repository
//!
//! Database operations for business categories. Categories are a flat
//! taxonomy; businesses reference them by id and keep that reference even
//! if the category row is later removed.

use crate::config::DatabaseDriver;
use crate::db::query::build_list_query;
use crate::db::DynDatabasePool;
use crate::models::{BusinessCategory, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const CATEGORY_COLUMNS: &str = "id, name, created_at, updated_at";

/// Business category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &BusinessCategory) -> Result<BusinessCategory>;

    /// Get category by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<BusinessCategory>>;

    /// Get category by name
    async fn get_by_name(&self, name: &str) -> Result<Option<BusinessCategory>>;

    /// List categories with pagination, filtering and ordering
    async fn get_list(&self, params: &ListParams) -> Result<(Vec<BusinessCategory>, i64)>;

    /// Update a category (full row) and return the stored record
    async fn update(&self, category: &BusinessCategory) -> Result<BusinessCategory>;

    /// Delete a category
    async fn delete(&self, id: &str) -> Result<()>;
}

/// SQLx-based business category repository implementation
///
/// Dispatches on the pool driver, so one type covers SQLite and MySQL.
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Box the repository for handing to the service layer
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &BusinessCategory) -> Result<BusinessCategory> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_category_sqlite(self.pool.as_sqlite().unwrap(), category).await
            }
            DatabaseDriver::Mysql => {
                create_category_mysql(self.pool.as_mysql().unwrap(), category).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<BusinessCategory>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_category_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<BusinessCategory>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_by_name_sqlite(self.pool.as_sqlite().unwrap(), name).await
            }
            DatabaseDriver::Mysql => {
                get_category_by_name_mysql(self.pool.as_mysql().unwrap(), name).await
            }
        }
    }

    async fn get_list(&self, params: &ListParams) -> Result<(Vec<BusinessCategory>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_categories_sqlite(self.pool.as_sqlite().unwrap(), params).await
            }
            DatabaseDriver::Mysql => {
                list_categories_mysql(self.pool.as_mysql().unwrap(), params).await
            }
        }
    }

    async fn update(&self, category: &BusinessCategory) -> Result<BusinessCategory> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_category_sqlite(self.pool.as_sqlite().unwrap(), category).await
            }
            DatabaseDriver::Mysql => {
                update_category_mysql(self.pool.as_mysql().unwrap(), category).await
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_category_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_category_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(
    pool: &SqlitePool,
    category: &BusinessCategory,
) -> Result<BusinessCategory> {
    sqlx::query(
        r#"
        INSERT INTO business_categories (id, name, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&category.id)
    .bind(&category.name)
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(category.clone())
}

async fn get_category_by_id_sqlite(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<BusinessCategory>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, created_at, updated_at
        FROM business_categories
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_category_sqlite(&row))),
        None => Ok(None),
    }
}

async fn get_category_by_name_sqlite(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<BusinessCategory>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, created_at, updated_at
        FROM business_categories
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by name")?;

    match row {
        Some(row) => Ok(Some(row_to_category_sqlite(&row))),
        None => Ok(None),
    }
}

async fn list_categories_sqlite(
    pool: &SqlitePool,
    params: &ListParams,
) -> Result<(Vec<BusinessCategory>, i64)> {
    let query = build_list_query("business_categories", CATEGORY_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select
        .fetch_all(pool)
        .await
        .context("Failed to list categories")?;

    let categories = rows.iter().map(row_to_category_sqlite).collect();

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count
        .fetch_one(pool)
        .await
        .context("Failed to count categories")?;
    let total: i64 = row.get("count");

    Ok((categories, total))
}

async fn update_category_sqlite(
    pool: &SqlitePool,
    category: &BusinessCategory,
) -> Result<BusinessCategory> {
    let now = Utc::now();

    sqlx::query("UPDATE business_categories SET name = ?, updated_at = ? WHERE id = ?")
        .bind(&category.name)
        .bind(now)
        .bind(&category.id)
        .execute(pool)
        .await
        .context("Failed to update category")?;

    get_category_by_id_sqlite(pool, &category.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category not found after update"))
}

async fn delete_category_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM business_categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;

    Ok(())
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> BusinessCategory {
    BusinessCategory {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_category_mysql(
    pool: &MySqlPool,
    category: &BusinessCategory,
) -> Result<BusinessCategory> {
    sqlx::query(
        r#"
        INSERT INTO business_categories (id, name, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&category.id)
    .bind(&category.name)
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(category.clone())
}

async fn get_category_by_id_mysql(
    pool: &MySqlPool,
    id: &str,
) -> Result<Option<BusinessCategory>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, created_at, updated_at
        FROM business_categories
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_category_mysql(&row))),
        None => Ok(None),
    }
}

async fn get_category_by_name_mysql(
    pool: &MySqlPool,
    name: &str,
) -> Result<Option<BusinessCategory>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, created_at, updated_at
        FROM business_categories
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by name")?;

    match row {
        Some(row) => Ok(Some(row_to_category_mysql(&row))),
        None => Ok(None),
    }
}

async fn list_categories_mysql(
    pool: &MySqlPool,
    params: &ListParams,
) -> Result<(Vec<BusinessCategory>, i64)> {
    let query = build_list_query("business_categories", CATEGORY_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select
        .fetch_all(pool)
        .await
        .context("Failed to list categories")?;

    let categories = rows.iter().map(row_to_category_mysql).collect();

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count
        .fetch_one(pool)
        .await
        .context("Failed to count categories")?;
    let total: i64 = row.get("count");

    Ok((categories, total))
}

async fn update_category_mysql(
    pool: &MySqlPool,
    category: &BusinessCategory,
) -> Result<BusinessCategory> {
    let now = Utc::now();

    sqlx::query("UPDATE business_categories SET name = ?, updated_at = ? WHERE id = ?")
        .bind(&category.name)
        .bind(now)
        .bind(&category.id)
        .execute(pool)
        .await
        .context("Failed to update category")?;

    get_category_by_id_mysql(pool, &category.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category not found after update"))
}

async fn delete_category_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM business_categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;

    Ok(())
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> BusinessCategory {
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    BusinessCategory {
        id: row.get("id"),
        name: row.get("name"),
        created_at,
        updated_at,
    }
}
