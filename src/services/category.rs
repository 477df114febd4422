//! Business category service
//!
//! CRUD over the flat category vocabulary businesses are listed under.
//! Names are unique; duplicates are rejected before they reach the
//! database.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::CategoryRepository;
use crate::models::{
    BusinessCategory, CreateCategoryInput, ListParams, PagedResult, UpdateCategoryInput,
};

/// Error types for category operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category name already exists
    #[error("Category name already exists: {0}")]
    DuplicateName(String),

    /// No category with the given id
    #[error("BusinessCategory not found")]
    NotFound,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Business category service
pub struct CategoryService {
    category_repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    /// Create a new category service
    pub fn new(category_repo: Arc<dyn CategoryRepository>) -> Self {
        Self { category_repo }
    }

    /// Create a category
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the name is empty
    /// - `DuplicateName` if a category with the name exists
    /// - `InternalError` for database errors
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<BusinessCategory, CategoryServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }

        if self
            .category_repo
            .get_by_name(&name)
            .await
            .context("Failed to check category name")?
            .is_some()
        {
            return Err(CategoryServiceError::DuplicateName(name));
        }

        let category = BusinessCategory::new(name);

        let created = self
            .category_repo
            .create(&category)
            .await
            .context("Failed to create category")?;

        Ok(created)
    }

    /// Fetch a category by id
    ///
    /// # Errors
    ///
    /// - `NotFound` if no category has the id
    pub async fn get(&self, id: &str) -> Result<BusinessCategory, CategoryServiceError> {
        self.category_repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or(CategoryServiceError::NotFound)
    }

    /// List categories with pagination, filtering, and ordering
    pub async fn get_list(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<BusinessCategory>, CategoryServiceError> {
        let (categories, total) = self
            .category_repo
            .get_list(params)
            .await
            .context("Failed to list categories")?;

        Ok(PagedResult::new(categories, total, params))
    }

    /// Rename a category
    ///
    /// # Errors
    ///
    /// - `NotFound` if no category has the id
    /// - `DuplicateName` if the new name belongs to another category
    /// - `InternalError` for database errors
    pub async fn update(
        &self,
        id: &str,
        input: UpdateCategoryInput,
    ) -> Result<BusinessCategory, CategoryServiceError> {
        let mut category = self.get(id).await?;

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CategoryServiceError::ValidationError(
                    "Category name cannot be empty".to_string(),
                ));
            }
            if name != category.name {
                if let Some(existing) = self
                    .category_repo
                    .get_by_name(&name)
                    .await
                    .context("Failed to check category name")?
                {
                    if existing.id != category.id {
                        return Err(CategoryServiceError::DuplicateName(name));
                    }
                }
                category.name = name;
            }
        }
        category.updated_at = Utc::now();

        let updated = self
            .category_repo
            .update(&category)
            .await
            .context("Failed to update category")?;

        Ok(updated)
    }

    /// Delete a category by id
    ///
    /// Businesses listed under the category keep their category id; there
    /// is no referential cleanup.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no category has the id
    pub async fn delete(&self, id: &str) -> Result<(), CategoryServiceError> {
        self.get(id).await?;

        self.category_repo
            .delete(id)
            .await
            .context("Failed to delete category")?;

        Ok(())
    }
}
