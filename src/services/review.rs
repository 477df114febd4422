//! Review service
//!
//! CRUD over reviews and their attachment sets, mirroring the business
//! service: reads hydrate attachments, writes run the attachment upsert
//! after the review row is persisted. Updates and deletes are restricted
//! to the review's author or an admin account, checked against the
//! persisted row.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::{AttachmentRepository, AttachmentTable, ReviewRepository};
use crate::models::{CreateReviewInput, ListParams, PagedResult, Review, UpdateReviewInput};

/// Error types for review operations
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    /// No review with the given id
    #[error("Review not found")]
    NotFound,

    /// Caller is neither the author nor an admin
    #[error("You have no access to the comment")]
    AccessDenied,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Review service
pub struct ReviewService {
    review_repo: Arc<dyn ReviewRepository>,
    attachment_repo: Arc<dyn AttachmentRepository>,
}

impl ReviewService {
    /// Create a new review service
    pub fn new(
        review_repo: Arc<dyn ReviewRepository>,
        attachment_repo: Arc<dyn AttachmentRepository>,
    ) -> Self {
        Self {
            review_repo,
            attachment_repo,
        }
    }

    /// Create a review
    ///
    /// The author id comes from the authenticated caller, not the request
    /// body. Submitted attachments are stored once the row exists and come
    /// back on the returned review.
    pub async fn create(&self, input: CreateReviewInput) -> Result<Review, ReviewServiceError> {
        let review = Review::new(
            input.business_id,
            input.user_id,
            input.rating,
            input.comment,
        );

        let mut created = self
            .review_repo
            .create(&review)
            .await
            .context("Failed to create review")?;

        created.attachments = self
            .attachment_repo
            .upsert(AttachmentTable::Review, &created.id, &input.attachments)
            .await
            .context("Failed to store review attachments")?;

        Ok(created)
    }

    /// Fetch a review by id with its attachments
    ///
    /// # Errors
    ///
    /// - `NotFound` if no review has the id
    pub async fn get(&self, id: &str) -> Result<Review, ReviewServiceError> {
        let mut review = self
            .review_repo
            .get_by_id(id)
            .await
            .context("Failed to get review")?
            .ok_or(ReviewServiceError::NotFound)?;

        review.attachments = self
            .attachment_repo
            .list_by_parent(AttachmentTable::Review, id)
            .await
            .context("Failed to load review attachments")?;

        Ok(review)
    }

    /// List reviews with pagination, filtering, and ordering
    ///
    /// Every returned review carries its attachments.
    pub async fn get_list(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Review>, ReviewServiceError> {
        let (mut reviews, total) = self
            .review_repo
            .get_list(params)
            .await
            .context("Failed to list reviews")?;

        for review in &mut reviews {
            review.attachments = self
                .attachment_repo
                .list_by_parent(AttachmentTable::Review, &review.id)
                .await
                .context("Failed to load review attachments")?;
        }

        Ok(PagedResult::new(reviews, total, params))
    }

    /// Apply a partial update to a review
    ///
    /// Only the persisted author or an admin may update. A submitted
    /// attachment list replaces the stored set through the upsert; leaving
    /// it out keeps the stored set untouched.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no review has the id
    /// - `AccessDenied` if the caller is neither author nor admin
    /// - `InternalError` for database errors
    pub async fn update(
        &self,
        id: &str,
        input: UpdateReviewInput,
        actor_id: &str,
        actor_is_admin: bool,
    ) -> Result<Review, ReviewServiceError> {
        let mut review = self
            .review_repo
            .get_by_id(id)
            .await
            .context("Failed to get review")?
            .ok_or(ReviewServiceError::NotFound)?;

        if !review.is_authored_by(actor_id) && !actor_is_admin {
            return Err(ReviewServiceError::AccessDenied);
        }

        if let Some(rating) = input.rating {
            review.rating = rating;
        }
        if let Some(comment) = input.comment {
            review.comment = comment;
        }
        review.updated_at = Utc::now();

        let mut updated = self
            .review_repo
            .update(&review)
            .await
            .context("Failed to update review")?;

        updated.attachments = match input.attachments {
            Some(items) => self
                .attachment_repo
                .upsert(AttachmentTable::Review, id, &items)
                .await
                .context("Failed to sync review attachments")?,
            None => self
                .attachment_repo
                .list_by_parent(AttachmentTable::Review, id)
                .await
                .context("Failed to load review attachments")?,
        };

        Ok(updated)
    }

    /// Delete a review and its attachments
    ///
    /// Only the persisted author or an admin may delete.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no review has the id
    /// - `AccessDenied` if the caller is neither author nor admin
    /// - `InternalError` for database errors
    pub async fn delete(
        &self,
        id: &str,
        actor_id: &str,
        actor_is_admin: bool,
    ) -> Result<(), ReviewServiceError> {
        let review = self
            .review_repo
            .get_by_id(id)
            .await
            .context("Failed to get review")?
            .ok_or(ReviewServiceError::NotFound)?;

        if !review.is_authored_by(actor_id) && !actor_is_admin {
            return Err(ReviewServiceError::AccessDenied);
        }

        self.attachment_repo
            .delete_by_parent(AttachmentTable::Review, id)
            .await
            .context("Failed to delete review attachments")?;
        self.review_repo
            .delete(id)
            .await
            .context("Failed to delete review")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;
    use crate::db::pool::{create_test_pool, DynDatabasePool};
    use crate::db::repositories::{SqlxAttachmentRepository, SqlxReviewRepository};
    use crate::models::{AttachmentInput, AttachmentKind, Filter, OrderBy};

    async fn setup_test_service() -> (DynDatabasePool, ReviewService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = ReviewService::new(
            SqlxReviewRepository::boxed(pool.clone()),
            SqlxAttachmentRepository::boxed(pool.clone()),
        );

        (pool, service)
    }

    fn create_input(business_id: &str, user_id: &str, rating: u8) -> CreateReviewInput {
        CreateReviewInput {
            business_id: business_id.to_string(),
            user_id: user_id.to_string(),
            rating,
            comment: "Great coffee, friendly staff".to_string(),
            attachments: vec![AttachmentInput::new("/uploads/latte.jpg", AttachmentKind::Photo)],
        }
    }

    // ========================================================================
    // Create tests
    // ========================================================================

    #[tokio::test]
    async fn test_create_review_with_attachments() {
        let (_pool, service) = setup_test_service().await;

        let review = service
            .create(create_input("business-1", "user-1", 5))
            .await
            .expect("Failed to create review");

        assert_eq!(review.business_id, "business-1");
        assert_eq!(review.user_id, "user-1");
        assert_eq!(review.rating, 5);
        assert_eq!(review.attachments.len(), 1);
        assert_eq!(review.attachments[0].filepath, "/uploads/latte.jpg");
    }

    #[tokio::test]
    async fn test_create_review_without_attachments() {
        let (_pool, service) = setup_test_service().await;

        let mut input = create_input("business-1", "user-1", 3);
        input.attachments = Vec::new();
        let review = service.create(input).await.expect("Failed to create review");

        assert!(review.attachments.is_empty());
    }

    // ========================================================================
    // Get and list tests
    // ========================================================================

    #[tokio::test]
    async fn test_get_hydrates_attachments() {
        let (_pool, service) = setup_test_service().await;

        let created = service
            .create(create_input("business-1", "user-1", 4))
            .await
            .expect("Failed to create review");

        let fetched = service.get(&created.id).await.expect("Failed to get review");

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.get("missing-id").await;

        assert!(matches!(result, Err(ReviewServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_list_filters_by_business() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(create_input("business-1", "user-1", 5))
            .await
            .expect("Failed to create review");
        service
            .create(create_input("business-1", "user-2", 2))
            .await
            .expect("Failed to create review");
        service
            .create(create_input("business-2", "user-1", 4))
            .await
            .expect("Failed to create review");

        let page = service
            .get_list(
                &ListParams::new(1, 10)
                    .with_filter(Filter::eq("business_id", "business-1"))
                    .with_order(OrderBy::desc("created_at")),
            )
            .await
            .expect("Failed to list reviews");

        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|r| r.business_id == "business-1"));
        assert!(page.items.iter().all(|r| r.attachments.len() == 1));
    }

    // ========================================================================
    // Update tests
    // ========================================================================

    #[tokio::test]
    async fn test_update_by_author() {
        let (_pool, service) = setup_test_service().await;

        let review = service
            .create(create_input("business-1", "user-1", 2))
            .await
            .expect("Failed to create review");

        let updated = service
            .update(
                &review.id,
                UpdateReviewInput {
                    rating: Some(4),
                    comment: Some("Better on a second visit".to_string()),
                    ..Default::default()
                },
                "user-1",
                false,
            )
            .await
            .expect("Failed to update review");

        assert_eq!(updated.rating, 4);
        assert_eq!(updated.comment, "Better on a second visit");
        // Attachments untouched when not submitted
        assert_eq!(updated.attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_attachment_set() {
        let (_pool, service) = setup_test_service().await;

        let review = service
            .create(create_input("business-1", "user-1", 5))
            .await
            .expect("Failed to create review");

        let updated = service
            .update(
                &review.id,
                UpdateReviewInput {
                    attachments: Some(vec![AttachmentInput::new(
                        "/uploads/interior.jpg",
                        AttachmentKind::Photo,
                    )]),
                    ..Default::default()
                },
                "user-1",
                false,
            )
            .await
            .expect("Failed to update review");

        assert_eq!(updated.attachments.len(), 1);
        assert_eq!(updated.attachments[0].filepath, "/uploads/interior.jpg");
    }

    #[tokio::test]
    async fn test_update_by_stranger_denied() {
        let (_pool, service) = setup_test_service().await;

        let review = service
            .create(create_input("business-1", "user-1", 5))
            .await
            .expect("Failed to create review");

        let result = service
            .update(&review.id, UpdateReviewInput::default(), "intruder", false)
            .await;

        assert!(matches!(result, Err(ReviewServiceError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_update_by_admin_allowed() {
        let (_pool, service) = setup_test_service().await;

        let review = service
            .create(create_input("business-1", "user-1", 5))
            .await
            .expect("Failed to create review");

        let updated = service
            .update(
                &review.id,
                UpdateReviewInput {
                    comment: Some("Moderated".to_string()),
                    ..Default::default()
                },
                "admin-1",
                true,
            )
            .await
            .expect("Failed to update review");

        assert_eq!(updated.comment, "Moderated");
        assert_eq!(updated.user_id, "user-1");
    }

    #[tokio::test]
    async fn test_update_missing_review_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .update("missing-id", UpdateReviewInput::default(), "user-1", true)
            .await;

        assert!(matches!(result, Err(ReviewServiceError::NotFound)));
    }

    // ========================================================================
    // Delete tests
    // ========================================================================

    #[tokio::test]
    async fn test_delete_by_author_removes_attachments() {
        let (_pool, service) = setup_test_service().await;

        let review = service
            .create(create_input("business-1", "user-1", 5))
            .await
            .expect("Failed to create review");

        service
            .delete(&review.id, "user-1", false)
            .await
            .expect("Failed to delete review");

        assert!(matches!(
            service.get(&review.id).await,
            Err(ReviewServiceError::NotFound)
        ));
        let orphans = service
            .attachment_repo
            .list_by_parent(AttachmentTable::Review, &review.id)
            .await
            .unwrap();
        assert!(orphans.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_stranger_denied() {
        let (_pool, service) = setup_test_service().await;

        let review = service
            .create(create_input("business-1", "user-1", 5))
            .await
            .expect("Failed to create review");

        let result = service.delete(&review.id, "intruder", false).await;

        assert!(matches!(result, Err(ReviewServiceError::AccessDenied)));
        service.get(&review.id).await.expect("Review should remain");
    }

    #[tokio::test]
    async fn test_delete_by_admin_allowed() {
        let (_pool, service) = setup_test_service().await;

        let review = service
            .create(create_input("business-1", "user-1", 1))
            .await
            .expect("Failed to create review");

        service
            .delete(&review.id, "admin-1", true)
            .await
            .expect("Failed to delete review");
    }

    #[tokio::test]
    async fn test_delete_missing_review_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.delete("missing-id", "user-1", true).await;

        assert!(matches!(result, Err(ReviewServiceError::NotFound)));
    }
}
