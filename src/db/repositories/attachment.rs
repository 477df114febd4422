//! Attachment repository
//!
//! Photo and video attachments for businesses and reviews live in two
//! structurally identical tables; `AttachmentTable` selects which one an
//! operation targets.
//!
//! The central operation is `upsert`: it reconciles a submitted attachment
//! list against the persisted set in one transaction. Submitted entries
//! without an id are inserted with fresh UUIDs, persisted rows missing from
//! the submitted set are deleted, and rows whose ids are resubmitted survive
//! untouched (original timestamps included).

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Attachment, AttachmentInput, AttachmentKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Table an attachment set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentTable {
    Business,
    Review,
}

impl AttachmentTable {
    /// Table holding the attachment rows.
    pub fn table(self) -> &'static str {
        match self {
            AttachmentTable::Business => "business_attachments",
            AttachmentTable::Review => "review_attachments",
        }
    }

    /// Column referencing the owning row.
    pub fn parent_column(self) -> &'static str {
        match self {
            AttachmentTable::Business => "business_id",
            AttachmentTable::Review => "review_id",
        }
    }
}

/// Attachment repository trait
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Reconcile the submitted attachment list against the persisted set for
    /// one parent, returning the parent's full attachment list afterwards.
    ///
    /// Not safe for concurrent calls on the same parent id.
    async fn upsert(
        &self,
        table: AttachmentTable,
        parent_id: &str,
        items: &[AttachmentInput],
    ) -> Result<Vec<Attachment>>;

    /// List all attachments of a parent, oldest first
    async fn list_by_parent(
        &self,
        table: AttachmentTable,
        parent_id: &str,
    ) -> Result<Vec<Attachment>>;

    /// Delete all attachments of a parent
    async fn delete_by_parent(&self, table: AttachmentTable, parent_id: &str) -> Result<()>;
}

/// SQLx-based attachment repository implementation
///
/// Dispatches on the pool driver, so one type covers SQLite and MySQL.
pub struct SqlxAttachmentRepository {
    pool: DynDatabasePool,
}

impl SqlxAttachmentRepository {
    /// Create a new SQLx attachment repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Box the repository for handing to the service layer
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AttachmentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AttachmentRepository for SqlxAttachmentRepository {
    async fn upsert(
        &self,
        table: AttachmentTable,
        parent_id: &str,
        items: &[AttachmentInput],
    ) -> Result<Vec<Attachment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                upsert_sqlite(self.pool.as_sqlite().unwrap(), table, parent_id, items).await
            }
            DatabaseDriver::Mysql => {
                upsert_mysql(self.pool.as_mysql().unwrap(), table, parent_id, items).await
            }
        }
    }

    async fn list_by_parent(
        &self,
        table: AttachmentTable,
        parent_id: &str,
    ) -> Result<Vec<Attachment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_parent_sqlite(self.pool.as_sqlite().unwrap(), table, parent_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_parent_mysql(self.pool.as_mysql().unwrap(), table, parent_id).await
            }
        }
    }

    async fn delete_by_parent(&self, table: AttachmentTable, parent_id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_by_parent_sqlite(self.pool.as_sqlite().unwrap(), table, parent_id).await
            }
            DatabaseDriver::Mysql => {
                delete_by_parent_mysql(self.pool.as_mysql().unwrap(), table, parent_id).await
            }
        }
    }
}

// Ids of submitted entries that already exist; freshly inserted ids are
// added to this set so the delete pass spares them.
fn keep_set(items: &[AttachmentInput]) -> HashSet<String> {
    items
        .iter()
        .filter(|item| !item.is_new())
        .filter_map(|item| item.id.clone())
        .collect()
}

fn insert_sql(table: AttachmentTable) -> String {
    format!(
        "INSERT INTO {} (id, {}, filepath, content_type, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
        table.table(),
        table.parent_column(),
    )
}

fn select_ids_sql(table: AttachmentTable) -> String {
    format!(
        "SELECT id FROM {} WHERE {} = ?",
        table.table(),
        table.parent_column(),
    )
}

fn delete_sql(table: AttachmentTable) -> String {
    format!("DELETE FROM {} WHERE id = ?", table.table())
}

fn list_sql(table: AttachmentTable) -> String {
    format!(
        "SELECT id, {}, filepath, content_type, created_at, updated_at FROM {} \
         WHERE {} = ? ORDER BY created_at ASC, id ASC",
        table.parent_column(),
        table.table(),
        table.parent_column(),
    )
}

fn delete_by_parent_sql(table: AttachmentTable) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?",
        table.table(),
        table.parent_column(),
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn upsert_sqlite(
    pool: &SqlitePool,
    table: AttachmentTable,
    parent_id: &str,
    items: &[AttachmentInput],
) -> Result<Vec<Attachment>> {
    let now = Utc::now();
    let mut keep = keep_set(items);

    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin attachment upsert")?;

    let insert = insert_sql(table);
    for item in items.iter().filter(|item| item.is_new()) {
        let id = Uuid::new_v4().to_string();
        let kind_str = item.content_type.to_string();

        sqlx::query(&insert)
            .bind(&id)
            .bind(parent_id)
            .bind(&item.filepath)
            .bind(&kind_str)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert attachment")?;

        keep.insert(id);
    }

    let ids_query = select_ids_sql(table);
    let rows = sqlx::query(&ids_query)
        .bind(parent_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to read attachment ids")?;

    let delete = delete_sql(table);
    for row in rows {
        let id: String = row.get("id");
        if !keep.contains(&id) {
            sqlx::query(&delete)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .context("Failed to delete attachment")?;
        }
    }

    // Read the reconciled set before committing so the returned list matches
    // exactly what this transaction persisted.
    let list = list_sql(table);
    let rows = sqlx::query(&list)
        .bind(parent_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list attachments")?;

    let mut attachments = Vec::new();
    for row in rows {
        attachments.push(row_to_attachment_sqlite(&row, table)?);
    }

    tx.commit()
        .await
        .context("Failed to commit attachment upsert")?;

    Ok(attachments)
}

async fn list_by_parent_sqlite(
    pool: &SqlitePool,
    table: AttachmentTable,
    parent_id: &str,
) -> Result<Vec<Attachment>> {
    let list = list_sql(table);
    let rows = sqlx::query(&list)
        .bind(parent_id)
        .fetch_all(pool)
        .await
        .context("Failed to list attachments")?;

    let mut attachments = Vec::new();
    for row in rows {
        attachments.push(row_to_attachment_sqlite(&row, table)?);
    }

    Ok(attachments)
}

async fn delete_by_parent_sqlite(
    pool: &SqlitePool,
    table: AttachmentTable,
    parent_id: &str,
) -> Result<()> {
    let delete = delete_by_parent_sql(table);
    sqlx::query(&delete)
        .bind(parent_id)
        .execute(pool)
        .await
        .context("Failed to delete attachments by parent")?;

    Ok(())
}

fn row_to_attachment_sqlite(
    row: &sqlx::sqlite::SqliteRow,
    table: AttachmentTable,
) -> Result<Attachment> {
    let kind_str: String = row.get("content_type");
    let content_type = AttachmentKind::from_str(&kind_str)
        .with_context(|| format!("Invalid attachment content type in database: {}", kind_str))?;

    Ok(Attachment {
        id: row.get("id"),
        parent_id: row.get(table.parent_column()),
        filepath: row.get("filepath"),
        content_type,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn upsert_mysql(
    pool: &MySqlPool,
    table: AttachmentTable,
    parent_id: &str,
    items: &[AttachmentInput],
) -> Result<Vec<Attachment>> {
    let now = Utc::now();
    let mut keep = keep_set(items);

    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin attachment upsert")?;

    let insert = insert_sql(table);
    for item in items.iter().filter(|item| item.is_new()) {
        let id = Uuid::new_v4().to_string();
        let kind_str = item.content_type.to_string();

        sqlx::query(&insert)
            .bind(&id)
            .bind(parent_id)
            .bind(&item.filepath)
            .bind(&kind_str)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert attachment")?;

        keep.insert(id);
    }

    let ids_query = select_ids_sql(table);
    let rows = sqlx::query(&ids_query)
        .bind(parent_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to read attachment ids")?;

    let delete = delete_sql(table);
    for row in rows {
        let id: String = row.get("id");
        if !keep.contains(&id) {
            sqlx::query(&delete)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .context("Failed to delete attachment")?;
        }
    }

    // Read the reconciled set before committing so the returned list matches
    // exactly what this transaction persisted.
    let list = list_sql(table);
    let rows = sqlx::query(&list)
        .bind(parent_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list attachments")?;

    let mut attachments = Vec::new();
    for row in rows {
        attachments.push(row_to_attachment_mysql(&row, table)?);
    }

    tx.commit()
        .await
        .context("Failed to commit attachment upsert")?;

    Ok(attachments)
}

async fn list_by_parent_mysql(
    pool: &MySqlPool,
    table: AttachmentTable,
    parent_id: &str,
) -> Result<Vec<Attachment>> {
    let list = list_sql(table);
    let rows = sqlx::query(&list)
        .bind(parent_id)
        .fetch_all(pool)
        .await
        .context("Failed to list attachments")?;

    let mut attachments = Vec::new();
    for row in rows {
        attachments.push(row_to_attachment_mysql(&row, table)?);
    }

    Ok(attachments)
}

async fn delete_by_parent_mysql(
    pool: &MySqlPool,
    table: AttachmentTable,
    parent_id: &str,
) -> Result<()> {
    let delete = delete_by_parent_sql(table);
    sqlx::query(&delete)
        .bind(parent_id)
        .execute(pool)
        .await
        .context("Failed to delete attachments by parent")?;

    Ok(())
}

fn row_to_attachment_mysql(
    row: &sqlx::mysql::MySqlRow,
    table: AttachmentTable,
) -> Result<Attachment> {
    let kind_str: String = row.get("content_type");
    let content_type = AttachmentKind::from_str(&kind_str)
        .with_context(|| format!("Invalid attachment content type in database: {}", kind_str))?;

    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Ok(Attachment {
        id: row.get("id"),
        parent_id: row.get(table.parent_column()),
        filepath: row.get("filepath"),
        content_type,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxAttachmentRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxAttachmentRepository::new(pool.clone());
        (pool, repo)
    }

    #[tokio::test]
    async fn test_upsert_inserts_new_items() {
        let (_pool, repo) = setup_test_repo().await;

        let items = vec![
            AttachmentInput::new("photos/front.jpg", AttachmentKind::Photo),
            AttachmentInput::new("videos/tour.mp4", AttachmentKind::Video),
        ];
        let stored = repo
            .upsert(AttachmentTable::Business, "business-1", &items)
            .await
            .expect("Failed to upsert attachments");

        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|a| !a.id.is_empty()));
        assert!(stored.iter().all(|a| a.parent_id == "business-1"));
        assert!(stored
            .iter()
            .any(|a| a.filepath == "photos/front.jpg" && a.content_type == AttachmentKind::Photo));
        assert!(stored
            .iter()
            .any(|a| a.filepath == "videos/tour.mp4" && a.content_type == AttachmentKind::Video));
    }

    #[tokio::test]
    async fn test_upsert_drops_omitted_and_keeps_resubmitted() {
        let (_pool, repo) = setup_test_repo().await;

        let initial = vec![
            AttachmentInput::new("a.jpg", AttachmentKind::Photo),
            AttachmentInput::new("b.jpg", AttachmentKind::Photo),
        ];
        let stored = repo
            .upsert(AttachmentTable::Business, "business-1", &initial)
            .await
            .expect("Failed to upsert attachments");
        let kept = stored
            .iter()
            .find(|a| a.filepath == "a.jpg")
            .expect("a.jpg missing")
            .clone();

        // Resubmit a.jpg by id, drop b.jpg, add c.jpg.
        let update = vec![
            AttachmentInput::existing(kept.id.clone(), "a.jpg", AttachmentKind::Photo),
            AttachmentInput::new("c.jpg", AttachmentKind::Photo),
        ];
        let stored = repo
            .upsert(AttachmentTable::Business, "business-1", &update)
            .await
            .expect("Failed to upsert attachments");

        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|a| a.id == kept.id));
        assert!(stored.iter().any(|a| a.filepath == "c.jpg"));
        assert!(!stored.iter().any(|a| a.filepath == "b.jpg"));
    }

    #[tokio::test]
    async fn test_upsert_keeps_original_timestamps() {
        let (_pool, repo) = setup_test_repo().await;

        let stored = repo
            .upsert(
                AttachmentTable::Business,
                "business-1",
                &[AttachmentInput::new("a.jpg", AttachmentKind::Photo)],
            )
            .await
            .expect("Failed to upsert attachments");
        let original = stored[0].clone();

        let stored = repo
            .upsert(
                AttachmentTable::Business,
                "business-1",
                &[AttachmentInput::existing(
                    original.id.clone(),
                    "a.jpg",
                    AttachmentKind::Photo,
                )],
            )
            .await
            .expect("Failed to upsert attachments");

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, original.id);
        assert_eq!(stored[0].created_at, original.created_at);
        assert_eq!(stored[0].updated_at, original.updated_at);
    }

    #[tokio::test]
    async fn test_upsert_identical_resubmission_is_noop() {
        let (_pool, repo) = setup_test_repo().await;

        let first = repo
            .upsert(
                AttachmentTable::Review,
                "review-1",
                &[
                    AttachmentInput::new("a.jpg", AttachmentKind::Photo),
                    AttachmentInput::new("b.mp4", AttachmentKind::Video),
                ],
            )
            .await
            .expect("Failed to upsert attachments");

        let resubmitted: Vec<AttachmentInput> = first
            .iter()
            .map(|a| AttachmentInput::existing(a.id.clone(), &a.filepath, a.content_type))
            .collect();
        let second = repo
            .upsert(AttachmentTable::Review, "review-1", &resubmitted)
            .await
            .expect("Failed to upsert attachments");

        assert_eq!(second.len(), first.len());
        for original in &first {
            let survivor = second
                .iter()
                .find(|a| a.id == original.id)
                .expect("attachment dropped on resubmission");
            assert_eq!(survivor.created_at, original.created_at);
            assert_eq!(survivor.updated_at, original.updated_at);
        }
    }

    #[tokio::test]
    async fn test_upsert_empty_list_clears_parent() {
        let (_pool, repo) = setup_test_repo().await;

        repo.upsert(
            AttachmentTable::Business,
            "business-1",
            &[
                AttachmentInput::new("a.jpg", AttachmentKind::Photo),
                AttachmentInput::new("b.jpg", AttachmentKind::Photo),
            ],
        )
        .await
        .expect("Failed to upsert attachments");

        let stored = repo
            .upsert(AttachmentTable::Business, "business-1", &[])
            .await
            .expect("Failed to upsert attachments");
        assert!(stored.is_empty());

        let listed = repo
            .list_by_parent(AttachmentTable::Business, "business-1")
            .await
            .expect("Failed to list attachments");
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_leaves_other_parents_alone() {
        let (_pool, repo) = setup_test_repo().await;

        repo.upsert(
            AttachmentTable::Business,
            "business-1",
            &[AttachmentInput::new("a.jpg", AttachmentKind::Photo)],
        )
        .await
        .expect("Failed to upsert attachments");
        repo.upsert(
            AttachmentTable::Business,
            "business-2",
            &[AttachmentInput::new("other.jpg", AttachmentKind::Photo)],
        )
        .await
        .expect("Failed to upsert attachments");

        repo.upsert(AttachmentTable::Business, "business-1", &[])
            .await
            .expect("Failed to upsert attachments");

        let other = repo
            .list_by_parent(AttachmentTable::Business, "business-2")
            .await
            .expect("Failed to list attachments");
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].filepath, "other.jpg");
    }

    #[tokio::test]
    async fn test_business_and_review_tables_are_independent() {
        let (_pool, repo) = setup_test_repo().await;

        repo.upsert(
            AttachmentTable::Business,
            "parent-1",
            &[AttachmentInput::new("storefront.jpg", AttachmentKind::Photo)],
        )
        .await
        .expect("Failed to upsert attachments");
        repo.upsert(
            AttachmentTable::Review,
            "parent-1",
            &[AttachmentInput::new("meal.jpg", AttachmentKind::Photo)],
        )
        .await
        .expect("Failed to upsert attachments");

        let business = repo
            .list_by_parent(AttachmentTable::Business, "parent-1")
            .await
            .expect("Failed to list attachments");
        let review = repo
            .list_by_parent(AttachmentTable::Review, "parent-1")
            .await
            .expect("Failed to list attachments");

        assert_eq!(business.len(), 1);
        assert_eq!(business[0].filepath, "storefront.jpg");
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].filepath, "meal.jpg");
    }

    #[tokio::test]
    async fn test_list_by_parent_orders_oldest_first() {
        let (_pool, repo) = setup_test_repo().await;

        // A single upsert stamps one timestamp on every insert, so the id
        // tiebreaker decides the order.
        let stored = repo
            .upsert(
                AttachmentTable::Review,
                "review-1",
                &[
                    AttachmentInput::new("one.jpg", AttachmentKind::Photo),
                    AttachmentInput::new("two.jpg", AttachmentKind::Photo),
                    AttachmentInput::new("three.jpg", AttachmentKind::Photo),
                ],
            )
            .await
            .expect("Failed to upsert attachments");

        let ids: Vec<String> = stored.iter().map(|a| a.id.clone()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn test_delete_by_parent() {
        let (_pool, repo) = setup_test_repo().await;

        repo.upsert(
            AttachmentTable::Review,
            "review-1",
            &[
                AttachmentInput::new("a.jpg", AttachmentKind::Photo),
                AttachmentInput::new("b.mp4", AttachmentKind::Video),
            ],
        )
        .await
        .expect("Failed to upsert attachments");

        repo.delete_by_parent(AttachmentTable::Review, "review-1")
            .await
            .expect("Failed to delete attachments");

        let listed = repo
            .list_by_parent(AttachmentTable::Review, "review-1")
            .await
            .expect("Failed to list attachments");
        assert!(listed.is_empty());
    }
}
