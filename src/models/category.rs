//! Business category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category a business is listed under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessCategory {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Category name
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl BusinessCategory {
    /// Create a new BusinessCategory with a freshly generated id.
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a category
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Category name
    pub name: String,
}

/// Input for updating a category
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name (optional)
    pub name: Option<String>,
}
