//! Review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attachment::{Attachment, AttachmentInput};

/// Review left by a user on a business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Reviewed business id
    pub business_id: String,
    /// Authoring user id
    pub user_id: String,
    /// Rating on a 0-255 scale
    pub rating: u8,
    /// Review text
    pub comment: String,
    /// Photo/video attachments, hydrated from the attachment table
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Create a new Review with a freshly generated id.
    pub fn new(business_id: String, user_id: String, rating: u8, comment: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            business_id,
            user_id,
            rating,
            comment,
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the review was written by `user_id`
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Input for creating a review
#[derive(Debug, Clone)]
pub struct CreateReviewInput {
    /// Reviewed business id
    pub business_id: String,
    /// Authoring user id
    pub user_id: String,
    /// Rating on a 0-255 scale
    pub rating: u8,
    /// Review text
    pub comment: String,
    /// Attachments to create alongside the review
    pub attachments: Vec<AttachmentInput>,
}

/// Input for updating a review
#[derive(Debug, Clone, Default)]
pub struct UpdateReviewInput {
    /// New rating (optional)
    pub rating: Option<u8>,
    /// New review text (optional)
    pub comment: Option<String>,
    /// Full replacement attachment set (optional); synchronized via upsert
    pub attachments: Option<Vec<AttachmentInput>>,
}
