//! Review repository
//!
//! Database operations for business reviews. Rows read here come back with
//! an empty attachment list, the attachment repository loads those
//! separately.

use crate::config::DatabaseDriver;
use crate::db::query::build_list_query;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, Review};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const REVIEW_COLUMNS: &str = "id, business_id, user_id, rating, comment, created_at, updated_at";

/// Review repository trait
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Create a new review
    async fn create(&self, review: &Review) -> Result<Review>;

    /// Get review by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Review>>;

    /// List reviews with pagination, filtering and ordering
    async fn get_list(&self, params: &ListParams) -> Result<(Vec<Review>, i64)>;

    /// Update a review's rating and comment, returning the stored record
    async fn update(&self, review: &Review) -> Result<Review>;

    /// Delete a review
    async fn delete(&self, id: &str) -> Result<()>;
}

/// SQLx-based review repository implementation
///
/// Dispatches on the pool driver, so one type covers SQLite and MySQL.
pub struct SqlxReviewRepository {
    pool: DynDatabasePool,
}

impl SqlxReviewRepository {
    /// Create a new SQLx review repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Box the repository for handing to the service layer
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReviewRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ReviewRepository for SqlxReviewRepository {
    async fn create(&self, review: &Review) -> Result<Review> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_review_sqlite(self.pool.as_sqlite().unwrap(), review).await
            }
            DatabaseDriver::Mysql => {
                create_review_mysql(self.pool.as_mysql().unwrap(), review).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Review>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_review_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_review_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_list(&self, params: &ListParams) -> Result<(Vec<Review>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_reviews_sqlite(self.pool.as_sqlite().unwrap(), params).await
            }
            DatabaseDriver::Mysql => {
                list_reviews_mysql(self.pool.as_mysql().unwrap(), params).await
            }
        }
    }

    async fn update(&self, review: &Review) -> Result<Review> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_review_sqlite(self.pool.as_sqlite().unwrap(), review).await
            }
            DatabaseDriver::Mysql => {
                update_review_mysql(self.pool.as_mysql().unwrap(), review).await
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_review_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_review_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_review_sqlite(pool: &SqlitePool, review: &Review) -> Result<Review> {
    sqlx::query(
        r#"
        INSERT INTO reviews (id, business_id, user_id, rating, comment, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&review.id)
    .bind(&review.business_id)
    .bind(&review.user_id)
    .bind(review.rating)
    .bind(&review.comment)
    .bind(review.created_at)
    .bind(review.updated_at)
    .execute(pool)
    .await
    .context("Failed to create review")?;

    Ok(review.clone())
}

async fn get_review_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Review>> {
    let row = sqlx::query(
        r#"
        SELECT id, business_id, user_id, rating, comment, created_at, updated_at
        FROM reviews
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get review by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_review_sqlite(&row))),
        None => Ok(None),
    }
}

async fn list_reviews_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<(Vec<Review>, i64)> {
    let query = build_list_query("reviews", REVIEW_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select
        .fetch_all(pool)
        .await
        .context("Failed to list reviews")?;

    let reviews = rows.iter().map(row_to_review_sqlite).collect();

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count
        .fetch_one(pool)
        .await
        .context("Failed to count reviews")?;
    let total: i64 = row.get("count");

    Ok((reviews, total))
}

async fn update_review_sqlite(pool: &SqlitePool, review: &Review) -> Result<Review> {
    let now = Utc::now();

    sqlx::query("UPDATE reviews SET rating = ?, comment = ?, updated_at = ? WHERE id = ?")
        .bind(review.rating)
        .bind(&review.comment)
        .bind(now)
        .bind(&review.id)
        .execute(pool)
        .await
        .context("Failed to update review")?;

    get_review_by_id_sqlite(pool, &review.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Review not found after update"))
}

async fn delete_review_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete review")?;

    Ok(())
}

fn row_to_review_sqlite(row: &sqlx::sqlite::SqliteRow) -> Review {
    Review {
        id: row.get("id"),
        business_id: row.get("business_id"),
        user_id: row.get("user_id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        attachments: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_review_mysql(pool: &MySqlPool, review: &Review) -> Result<Review> {
    sqlx::query(
        r#"
        INSERT INTO reviews (id, business_id, user_id, rating, comment, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&review.id)
    .bind(&review.business_id)
    .bind(&review.user_id)
    .bind(review.rating)
    .bind(&review.comment)
    .bind(review.created_at)
    .bind(review.updated_at)
    .execute(pool)
    .await
    .context("Failed to create review")?;

    Ok(review.clone())
}

async fn get_review_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Review>> {
    let row = sqlx::query(
        r#"
        SELECT id, business_id, user_id, rating, comment, created_at, updated_at
        FROM reviews
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get review by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_review_mysql(&row))),
        None => Ok(None),
    }
}

async fn list_reviews_mysql(pool: &MySqlPool, params: &ListParams) -> Result<(Vec<Review>, i64)> {
    let query = build_list_query("reviews", REVIEW_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select
        .fetch_all(pool)
        .await
        .context("Failed to list reviews")?;

    let reviews = rows.iter().map(row_to_review_mysql).collect();

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count
        .fetch_one(pool)
        .await
        .context("Failed to count reviews")?;
    let total: i64 = row.get("count");

    Ok((reviews, total))
}

async fn update_review_mysql(pool: &MySqlPool, review: &Review) -> Result<Review> {
    let now = Utc::now();

    sqlx::query("UPDATE reviews SET rating = ?, comment = ?, updated_at = ? WHERE id = ?")
        .bind(review.rating)
        .bind(&review.comment)
        .bind(now)
        .bind(&review.id)
        .execute(pool)
        .await
        .context("Failed to update review")?;

    get_review_by_id_mysql(pool, &review.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Review not found after update"))
}

async fn delete_review_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete review")?;

    Ok(())
}

fn row_to_review_mysql(row: &sqlx::mysql::MySqlRow) -> Review {
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Review {
        id: row.get("id"),
        business_id: row.get("business_id"),
        user_id: row.get("user_id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        attachments: Vec::new(),
        created_at,
        updated_at,
    }
}
