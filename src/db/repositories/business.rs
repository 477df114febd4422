//! Business repository
//!
//! Database operations for business listings. Contact info and hours of
//! operation are stored as JSON text columns; rows read here come back with
//! an empty attachment list, the attachment repository loads those
//! separately.

use crate::config::DatabaseDriver;
use crate::db::query::build_list_query;
use crate::db::DynDatabasePool;
use crate::models::{Business, ContactInfo, HoursOfOperation, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const BUSINESS_COLUMNS: &str = "id, name, description, category_id, address, latitude, longitude, \
     contact_info, hours_of_operation, owner_id, created_at, updated_at";

/// Business repository trait
#[async_trait]
pub trait BusinessRepository: Send + Sync {
    /// Create a new business
    async fn create(&self, business: &Business) -> Result<Business>;

    /// Get business by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Business>>;

    /// List businesses with pagination, filtering and ordering
    async fn get_list(&self, params: &ListParams) -> Result<(Vec<Business>, i64)>;

    /// Update a business (full row) and return the stored record
    async fn update(&self, business: &Business) -> Result<Business>;

    /// Delete a business
    async fn delete(&self, id: &str) -> Result<()>;
}

/// SQLx-based business repository implementation
///
/// Dispatches on the pool driver, so one type covers SQLite and MySQL.
pub struct SqlxBusinessRepository {
    pool: DynDatabasePool,
}

impl SqlxBusinessRepository {
    /// Create a new SQLx business repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Box the repository for handing to the service layer
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BusinessRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BusinessRepository for SqlxBusinessRepository {
    async fn create(&self, business: &Business) -> Result<Business> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_business_sqlite(self.pool.as_sqlite().unwrap(), business).await
            }
            DatabaseDriver::Mysql => {
                create_business_mysql(self.pool.as_mysql().unwrap(), business).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Business>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_business_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_business_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_list(&self, params: &ListParams) -> Result<(Vec<Business>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_businesses_sqlite(self.pool.as_sqlite().unwrap(), params).await
            }
            DatabaseDriver::Mysql => {
                list_businesses_mysql(self.pool.as_mysql().unwrap(), params).await
            }
        }
    }

    async fn update(&self, business: &Business) -> Result<Business> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_business_sqlite(self.pool.as_sqlite().unwrap(), business).await
            }
            DatabaseDriver::Mysql => {
                update_business_mysql(self.pool.as_mysql().unwrap(), business).await
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_business_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_business_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

fn parse_contact_info(json: Option<String>) -> Result<ContactInfo> {
    match json {
        Some(s) if !s.is_empty() => serde_json::from_str(&s)
            .with_context(|| format!("Invalid contact info in database: {}", s)),
        _ => Ok(ContactInfo::default()),
    }
}

fn parse_hours_of_operation(json: Option<String>) -> Result<HoursOfOperation> {
    match json {
        Some(s) if !s.is_empty() => serde_json::from_str(&s)
            .with_context(|| format!("Invalid hours of operation in database: {}", s)),
        _ => Ok(HoursOfOperation::default()),
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_business_sqlite(pool: &SqlitePool, business: &Business) -> Result<Business> {
    let contact_json = serde_json::to_string(&business.contact_info)
        .context("Failed to serialize contact info")?;
    let hours_json = serde_json::to_string(&business.hours_of_operation)
        .context("Failed to serialize hours of operation")?;

    sqlx::query(
        r#"
        INSERT INTO businesses (id, name, description, category_id, address, latitude, longitude,
                                contact_info, hours_of_operation, owner_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&business.id)
    .bind(&business.name)
    .bind(&business.description)
    .bind(&business.category_id)
    .bind(&business.address)
    .bind(business.latitude)
    .bind(business.longitude)
    .bind(&contact_json)
    .bind(&hours_json)
    .bind(&business.owner_id)
    .bind(business.created_at)
    .bind(business.updated_at)
    .execute(pool)
    .await
    .context("Failed to create business")?;

    Ok(business.clone())
}

async fn get_business_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Business>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, description, category_id, address, latitude, longitude,
               contact_info, hours_of_operation, owner_id, created_at, updated_at
        FROM businesses
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get business by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_business_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_businesses_sqlite(
    pool: &SqlitePool,
    params: &ListParams,
) -> Result<(Vec<Business>, i64)> {
    let query = build_list_query("businesses", BUSINESS_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select
        .fetch_all(pool)
        .await
        .context("Failed to list businesses")?;

    let mut businesses = Vec::new();
    for row in rows {
        businesses.push(row_to_business_sqlite(&row)?);
    }

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count
        .fetch_one(pool)
        .await
        .context("Failed to count businesses")?;
    let total: i64 = row.get("count");

    Ok((businesses, total))
}

async fn update_business_sqlite(pool: &SqlitePool, business: &Business) -> Result<Business> {
    let now = Utc::now();
    let contact_json = serde_json::to_string(&business.contact_info)
        .context("Failed to serialize contact info")?;
    let hours_json = serde_json::to_string(&business.hours_of_operation)
        .context("Failed to serialize hours of operation")?;

    sqlx::query(
        r#"
        UPDATE businesses
        SET name = ?, description = ?, category_id = ?, address = ?, latitude = ?, longitude = ?,
            contact_info = ?, hours_of_operation = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&business.name)
    .bind(&business.description)
    .bind(&business.category_id)
    .bind(&business.address)
    .bind(business.latitude)
    .bind(business.longitude)
    .bind(&contact_json)
    .bind(&hours_json)
    .bind(now)
    .bind(&business.id)
    .execute(pool)
    .await
    .context("Failed to update business")?;

    get_business_by_id_sqlite(pool, &business.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Business not found after update"))
}

async fn delete_business_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM businesses WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete business")?;

    Ok(())
}

fn row_to_business_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Business> {
    let contact_info = parse_contact_info(row.get("contact_info"))?;
    let hours_of_operation = parse_hours_of_operation(row.get("hours_of_operation"))?;

    Ok(Business {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        category_id: row.get("category_id"),
        address: row.get("address"),
        attachments: Vec::new(),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        contact_info,
        hours_of_operation,
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_business_mysql(pool: &MySqlPool, business: &Business) -> Result<Business> {
    let contact_json = serde_json::to_string(&business.contact_info)
        .context("Failed to serialize contact info")?;
    let hours_json = serde_json::to_string(&business.hours_of_operation)
        .context("Failed to serialize hours of operation")?;

    sqlx::query(
        r#"
        INSERT INTO businesses (id, name, description, category_id, address, latitude, longitude,
                                contact_info, hours_of_operation, owner_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&business.id)
    .bind(&business.name)
    .bind(&business.description)
    .bind(&business.category_id)
    .bind(&business.address)
    .bind(business.latitude)
    .bind(business.longitude)
    .bind(&contact_json)
    .bind(&hours_json)
    .bind(&business.owner_id)
    .bind(business.created_at)
    .bind(business.updated_at)
    .execute(pool)
    .await
    .context("Failed to create business")?;

    Ok(business.clone())
}

async fn get_business_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Business>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, description, category_id, address, latitude, longitude,
               contact_info, hours_of_operation, owner_id, created_at, updated_at
        FROM businesses
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get business by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_business_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_businesses_mysql(
    pool: &MySqlPool,
    params: &ListParams,
) -> Result<(Vec<Business>, i64)> {
    let query = build_list_query("businesses", BUSINESS_COLUMNS, params)?;

    let mut select = sqlx::query(&query.select_sql);
    for bind in &query.binds {
        select = select.bind(bind);
    }
    let rows = select
        .fetch_all(pool)
        .await
        .context("Failed to list businesses")?;

    let mut businesses = Vec::new();
    for row in rows {
        businesses.push(row_to_business_mysql(&row)?);
    }

    let mut count = sqlx::query(&query.count_sql);
    for bind in &query.binds {
        count = count.bind(bind);
    }
    let row = count
        .fetch_one(pool)
        .await
        .context("Failed to count businesses")?;
    let total: i64 = row.get("count");

    Ok((businesses, total))
}

async fn update_business_mysql(pool: &MySqlPool, business: &Business) -> Result<Business> {
    let now = Utc::now();
    let contact_json = serde_json::to_string(&business.contact_info)
        .context("Failed to serialize contact info")?;
    let hours_json = serde_json::to_string(&business.hours_of_operation)
        .context("Failed to serialize hours of operation")?;

    sqlx::query(
        r#"
        UPDATE businesses
        SET name = ?, description = ?, category_id = ?, address = ?, latitude = ?, longitude = ?,
            contact_info = ?, hours_of_operation = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&business.name)
    .bind(&business.description)
    .bind(&business.category_id)
    .bind(&business.address)
    .bind(business.latitude)
    .bind(business.longitude)
    .bind(&contact_json)
    .bind(&hours_json)
    .bind(now)
    .bind(&business.id)
    .execute(pool)
    .await
    .context("Failed to update business")?;

    get_business_by_id_mysql(pool, &business.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Business not found after update"))
}

async fn delete_business_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM businesses WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete business")?;

    Ok(())
}

fn row_to_business_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Business> {
    let contact_info = parse_contact_info(row.get("contact_info"))?;
    let hours_of_operation = parse_hours_of_operation(row.get("hours_of_operation"))?;

    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Ok(Business {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        category_id: row.get("category_id"),
        address: row.get("address"),
        attachments: Vec::new(),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        contact_info,
        hours_of_operation,
        owner_id: row.get("owner_id"),
        created_at,
        updated_at,
    })
}
