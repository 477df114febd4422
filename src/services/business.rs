//! Business service
//!
//! CRUD over business listings plus their attachment sets. Reads hydrate
//! attachments from the attachment table; writes run the attachment
//! upsert after the business row is persisted. Updates and deletes are
//! restricted to the listing's owner or an admin account, checked against
//! the persisted row rather than anything the caller submits.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::{AttachmentRepository, AttachmentTable, BusinessRepository};
use crate::models::{
    Business, CreateBusinessInput, ListParams, PagedResult, UpdateBusinessInput,
};

/// Error types for business operations
#[derive(Debug, thiserror::Error)]
pub enum BusinessServiceError {
    /// No business with the given id
    #[error("Business not found")]
    NotFound,

    /// Caller is neither the owner nor an admin
    #[error("Access denied, only owner or admin can {0} business")]
    AccessDenied(&'static str),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Business service
pub struct BusinessService {
    business_repo: Arc<dyn BusinessRepository>,
    attachment_repo: Arc<dyn AttachmentRepository>,
}

impl BusinessService {
    /// Create a new business service
    pub fn new(
        business_repo: Arc<dyn BusinessRepository>,
        attachment_repo: Arc<dyn AttachmentRepository>,
    ) -> Self {
        Self {
            business_repo,
            attachment_repo,
        }
    }

    /// Create a business listing
    ///
    /// The owner id comes from the authenticated caller, not the request
    /// body. Submitted attachments are stored once the row exists and come
    /// back on the returned listing.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the name is empty
    /// - `InternalError` for database errors
    pub async fn create(
        &self,
        input: CreateBusinessInput,
    ) -> Result<Business, BusinessServiceError> {
        if input.name.trim().is_empty() {
            return Err(BusinessServiceError::ValidationError(
                "Business name cannot be empty".to_string(),
            ));
        }

        let mut business = Business::new(
            input.name,
            input.category_id,
            input.address,
            input.owner_id,
        );
        business.description = input.description;
        business.latitude = input.latitude;
        business.longitude = input.longitude;
        if let Some(contact_info) = input.contact_info {
            business.contact_info = contact_info;
        }
        if let Some(hours) = input.hours_of_operation {
            business.hours_of_operation = hours;
        }

        let mut created = self
            .business_repo
            .create(&business)
            .await
            .context("Failed to create business")?;

        created.attachments = self
            .attachment_repo
            .upsert(AttachmentTable::Business, &created.id, &input.attachments)
            .await
            .context("Failed to store business attachments")?;

        Ok(created)
    }

    /// Fetch a business by id with its attachments
    ///
    /// # Errors
    ///
    /// - `NotFound` if no business has the id
    pub async fn get(&self, id: &str) -> Result<Business, BusinessServiceError> {
        let mut business = self
            .business_repo
            .get_by_id(id)
            .await
            .context("Failed to get business")?
            .ok_or(BusinessServiceError::NotFound)?;

        business.attachments = self
            .attachment_repo
            .list_by_parent(AttachmentTable::Business, id)
            .await
            .context("Failed to load business attachments")?;

        Ok(business)
    }

    /// List businesses with pagination, filtering, and ordering
    ///
    /// Every returned listing carries its attachments.
    pub async fn get_list(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Business>, BusinessServiceError> {
        let (mut businesses, total) = self
            .business_repo
            .get_list(params)
            .await
            .context("Failed to list businesses")?;

        for business in &mut businesses {
            business.attachments = self
                .attachment_repo
                .list_by_parent(AttachmentTable::Business, &business.id)
                .await
                .context("Failed to load business attachments")?;
        }

        Ok(PagedResult::new(businesses, total, params))
    }

    /// Apply a partial update to a business
    ///
    /// Only the persisted owner or an admin may update. A submitted
    /// attachment list replaces the stored set through the upsert; leaving
    /// it out keeps the stored set untouched.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no business has the id
    /// - `AccessDenied` if the caller is neither owner nor admin
    /// - `InternalError` for database errors
    pub async fn update(
        &self,
        id: &str,
        input: UpdateBusinessInput,
        actor_id: &str,
        actor_is_admin: bool,
    ) -> Result<Business, BusinessServiceError> {
        let mut business = self
            .business_repo
            .get_by_id(id)
            .await
            .context("Failed to get business")?
            .ok_or(BusinessServiceError::NotFound)?;

        if !business.is_owned_by(actor_id) && !actor_is_admin {
            return Err(BusinessServiceError::AccessDenied("update"));
        }

        if let Some(name) = input.name {
            business.name = name;
        }
        if let Some(description) = input.description {
            business.description = Some(description);
        }
        if let Some(category_id) = input.category_id {
            business.category_id = category_id;
        }
        if let Some(address) = input.address {
            business.address = address;
        }
        if let Some(latitude) = input.latitude {
            business.latitude = Some(latitude);
        }
        if let Some(longitude) = input.longitude {
            business.longitude = Some(longitude);
        }
        if let Some(contact_info) = input.contact_info {
            business.contact_info = contact_info;
        }
        if let Some(hours) = input.hours_of_operation {
            business.hours_of_operation = hours;
        }
        business.updated_at = Utc::now();

        let mut updated = self
            .business_repo
            .update(&business)
            .await
            .context("Failed to update business")?;

        updated.attachments = match input.attachments {
            Some(items) => self
                .attachment_repo
                .upsert(AttachmentTable::Business, id, &items)
                .await
                .context("Failed to sync business attachments")?,
            None => self
                .attachment_repo
                .list_by_parent(AttachmentTable::Business, id)
                .await
                .context("Failed to load business attachments")?,
        };

        Ok(updated)
    }

    /// Delete a business and its attachments
    ///
    /// Only the persisted owner or an admin may delete.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no business has the id
    /// - `AccessDenied` if the caller is neither owner nor admin
    /// - `InternalError` for database errors
    pub async fn delete(
        &self,
        id: &str,
        actor_id: &str,
        actor_is_admin: bool,
    ) -> Result<(), BusinessServiceError> {
        let business = self
            .business_repo
            .get_by_id(id)
            .await
            .context("Failed to get business")?
            .ok_or(BusinessServiceError::NotFound)?;

        if !business.is_owned_by(actor_id) && !actor_is_admin {
            return Err(BusinessServiceError::AccessDenied("delete"));
        }

        self.attachment_repo
            .delete_by_parent(AttachmentTable::Business, id)
            .await
            .context("Failed to delete business attachments")?;
        self.business_repo
            .delete(id)
            .await
            .context("Failed to delete business")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;
    use crate::db::pool::{create_test_pool, DynDatabasePool};
    use crate::db::repositories::{SqlxAttachmentRepository, SqlxBusinessRepository};
    use crate::models::{AttachmentInput, AttachmentKind, ContactInfo, Filter, OrderBy};

    async fn setup_test_service() -> (DynDatabasePool, BusinessService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = BusinessService::new(
            SqlxBusinessRepository::boxed(pool.clone()),
            SqlxAttachmentRepository::boxed(pool.clone()),
        );

        (pool, service)
    }

    fn create_input(name: &str, owner_id: &str) -> CreateBusinessInput {
        CreateBusinessInput {
            name: name.to_string(),
            description: Some("A test business".to_string()),
            category_id: "category-1".to_string(),
            address: "1 Main St".to_string(),
            latitude: Some(41.31),
            longitude: Some(69.24),
            contact_info: Some(ContactInfo {
                phone: "+1-555-0100".to_string(),
                email: "hello@example.com".to_string(),
                website: "https://example.com".to_string(),
            }),
            hours_of_operation: None,
            attachments: vec![
                AttachmentInput::new("/uploads/front.jpg", AttachmentKind::Photo),
                AttachmentInput::new("/uploads/tour.mp4", AttachmentKind::Video),
            ],
            owner_id: owner_id.to_string(),
        }
    }

    // ========================================================================
    // Create tests
    // ========================================================================

    #[tokio::test]
    async fn test_create_persists_all_fields() {
        let (_pool, service) = setup_test_service().await;

        let business = service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create business");

        assert_eq!(business.name, "Blue Bottle");
        assert_eq!(business.owner_id, "owner-1");
        assert_eq!(business.description.as_deref(), Some("A test business"));
        assert_eq!(business.latitude, Some(41.31));
        assert_eq!(business.contact_info.phone, "+1-555-0100");
        assert_eq!(business.attachments.len(), 2);

        // Round-trip through the repository keeps everything
        let fetched = service.get(&business.id).await.expect("Failed to get");
        assert_eq!(fetched.contact_info, business.contact_info);
        assert_eq!(fetched.attachments.len(), 2);
    }

    #[tokio::test]
    async fn test_create_empty_name_fails() {
        let (_pool, service) = setup_test_service().await;

        let mut input = create_input("", "owner-1");
        input.name = "  ".to_string();
        let result = service.create(input).await;

        assert!(matches!(
            result,
            Err(BusinessServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_without_attachments() {
        let (_pool, service) = setup_test_service().await;

        let mut input = create_input("Blue Bottle", "owner-1");
        input.attachments = Vec::new();
        let business = service.create(input).await.expect("Failed to create");

        assert!(business.attachments.is_empty());
    }

    // ========================================================================
    // Get and list tests
    // ========================================================================

    #[tokio::test]
    async fn test_get_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.get("missing-id").await;

        assert!(matches!(result, Err(BusinessServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_list_hydrates_attachments() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create");
        let mut bare = create_input("Empty Cafe", "owner-1");
        bare.attachments = Vec::new();
        service.create(bare).await.expect("Failed to create");

        let page = service
            .get_list(&ListParams::new(1, 10).with_order(OrderBy::asc("name")))
            .await
            .expect("Failed to list");

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].name, "Blue Bottle");
        assert_eq!(page.items[0].attachments.len(), 2);
        assert!(page.items[1].attachments.is_empty());
    }

    #[tokio::test]
    async fn test_get_list_search_filter() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create");
        service
            .create(create_input("Red Rooster", "owner-2"))
            .await
            .expect("Failed to create");

        let page = service
            .get_list(&ListParams::new(1, 10).with_filter(Filter::search("name", "Blue")))
            .await
            .expect("Failed to list");

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Blue Bottle");
    }

    // ========================================================================
    // Update tests
    // ========================================================================

    #[tokio::test]
    async fn test_update_by_owner() {
        let (_pool, service) = setup_test_service().await;

        let business = service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create");

        let updated = service
            .update(
                &business.id,
                UpdateBusinessInput {
                    name: Some("Blue Bottle Roastery".to_string()),
                    address: Some("2 Side St".to_string()),
                    ..Default::default()
                },
                "owner-1",
                false,
            )
            .await
            .expect("Failed to update");

        assert_eq!(updated.name, "Blue Bottle Roastery");
        assert_eq!(updated.address, "2 Side St");
        // Untouched fields and attachments survive
        assert_eq!(updated.category_id, "category-1");
        assert_eq!(updated.attachments.len(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_attachment_set() {
        let (_pool, service) = setup_test_service().await;

        let business = service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create");
        let kept = business
            .attachments
            .iter()
            .find(|a| a.filepath == "/uploads/front.jpg")
            .unwrap()
            .clone();

        let updated = service
            .update(
                &business.id,
                UpdateBusinessInput {
                    attachments: Some(vec![
                        AttachmentInput::existing(&kept.id, &kept.filepath, kept.content_type),
                        AttachmentInput::new("/uploads/menu.jpg", AttachmentKind::Photo),
                    ]),
                    ..Default::default()
                },
                "owner-1",
                false,
            )
            .await
            .expect("Failed to update");

        assert_eq!(updated.attachments.len(), 2);
        let paths: Vec<&str> = updated
            .attachments
            .iter()
            .map(|a| a.filepath.as_str())
            .collect();
        assert!(paths.contains(&"/uploads/front.jpg"));
        assert!(paths.contains(&"/uploads/menu.jpg"));
        // The video not in the submitted set is gone
        assert!(!paths.contains(&"/uploads/tour.mp4"));
        // The kept attachment holds its row id
        assert!(updated.attachments.iter().any(|a| a.id == kept.id));
    }

    #[tokio::test]
    async fn test_update_by_stranger_denied() {
        let (_pool, service) = setup_test_service().await;

        let business = service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create");

        let result = service
            .update(
                &business.id,
                UpdateBusinessInput::default(),
                "intruder",
                false,
            )
            .await;

        assert!(matches!(
            result,
            Err(BusinessServiceError::AccessDenied("update"))
        ));
    }

    #[tokio::test]
    async fn test_update_by_admin_allowed() {
        let (_pool, service) = setup_test_service().await;

        let business = service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create");

        let updated = service
            .update(
                &business.id,
                UpdateBusinessInput {
                    name: Some("Moderated Name".to_string()),
                    ..Default::default()
                },
                "admin-1",
                true,
            )
            .await
            .expect("Failed to update");

        assert_eq!(updated.name, "Moderated Name");
        assert_eq!(updated.owner_id, "owner-1");
    }

    #[tokio::test]
    async fn test_update_missing_business_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .update("missing-id", UpdateBusinessInput::default(), "owner-1", true)
            .await;

        assert!(matches!(result, Err(BusinessServiceError::NotFound)));
    }

    // ========================================================================
    // Delete tests
    // ========================================================================

    #[tokio::test]
    async fn test_delete_by_owner_removes_attachments() {
        let (_pool, service) = setup_test_service().await;

        let business = service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create");

        service
            .delete(&business.id, "owner-1", false)
            .await
            .expect("Failed to delete");

        assert!(matches!(
            service.get(&business.id).await,
            Err(BusinessServiceError::NotFound)
        ));
        let orphans = service
            .attachment_repo
            .list_by_parent(AttachmentTable::Business, &business.id)
            .await
            .unwrap();
        assert!(orphans.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_stranger_denied() {
        let (_pool, service) = setup_test_service().await;

        let business = service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create");

        let result = service.delete(&business.id, "intruder", false).await;

        assert!(matches!(
            result,
            Err(BusinessServiceError::AccessDenied("delete"))
        ));
        // Still there
        service.get(&business.id).await.expect("Business should remain");
    }

    #[tokio::test]
    async fn test_delete_by_admin_allowed() {
        let (_pool, service) = setup_test_service().await;

        let business = service
            .create(create_input("Blue Bottle", "owner-1"))
            .await
            .expect("Failed to create");

        service
            .delete(&business.id, "admin-1", true)
            .await
            .expect("Failed to delete");
    }

    #[tokio::test]
    async fn test_delete_missing_business_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.delete("missing-id", "owner-1", true).await;

        assert!(matches!(result, Err(BusinessServiceError::NotFound)));
    }
}
