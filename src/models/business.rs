//! Business model
//!
//! This module defines the Business entity together with the structured
//! contact-info and hours-of-operation values, both persisted as JSON text
//! in a single column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attachment::{Attachment, AttachmentInput};

/// Business listing entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Business name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Category this business is listed under
    pub category_id: String,
    /// Street address
    pub address: String,
    /// Photo/video attachments, hydrated from the attachment table
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Latitude coordinate
    pub latitude: Option<f64>,
    /// Longitude coordinate
    pub longitude: Option<f64>,
    /// Structured contact details (JSON text column)
    #[serde(default)]
    pub contact_info: ContactInfo,
    /// Opening hours per weekday (JSON text column)
    #[serde(default)]
    pub hours_of_operation: HoursOfOperation,
    /// Owning user id
    pub owner_id: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Business {
    /// Create a new Business with a freshly generated id.
    pub fn new(name: String, category_id: String, address: String, owner_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: None,
            category_id,
            address,
            attachments: Vec::new(),
            latitude: None,
            longitude: None,
            contact_info: ContactInfo::default(),
            hours_of_operation: HoursOfOperation::default(),
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the business is owned by `user_id`
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

/// Contact details for a business.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    /// Phone number
    pub phone: String,
    /// Contact email
    pub email: String,
    /// Website URL
    pub website: String,
}

impl ContactInfo {
    /// Check if no contact detail is set
    pub fn is_empty(&self) -> bool {
        self.phone.is_empty() && self.email.is_empty() && self.website.is_empty()
    }
}

/// Opening hours per weekday, free-form strings like "09:00-18:00".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoursOfOperation {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

/// Input for creating a business
#[derive(Debug, Clone)]
pub struct CreateBusinessInput {
    /// Business name
    pub name: String,
    /// Free-form description (optional)
    pub description: Option<String>,
    /// Category id
    pub category_id: String,
    /// Street address
    pub address: String,
    /// Latitude coordinate (optional)
    pub latitude: Option<f64>,
    /// Longitude coordinate (optional)
    pub longitude: Option<f64>,
    /// Contact details (optional)
    pub contact_info: Option<ContactInfo>,
    /// Opening hours (optional)
    pub hours_of_operation: Option<HoursOfOperation>,
    /// Photo/video attachments to store alongside the business
    pub attachments: Vec<AttachmentInput>,
    /// Owning user id
    pub owner_id: String,
}

/// Input for updating a business
#[derive(Debug, Clone, Default)]
pub struct UpdateBusinessInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
    /// New category id (optional)
    pub category_id: Option<String>,
    /// New address (optional)
    pub address: Option<String>,
    /// New latitude (optional)
    pub latitude: Option<f64>,
    /// New longitude (optional)
    pub longitude: Option<f64>,
    /// New contact details (optional)
    pub contact_info: Option<ContactInfo>,
    /// New opening hours (optional)
    pub hours_of_operation: Option<HoursOfOperation>,
    /// Replacement attachment set; `None` leaves attachments untouched
    pub attachments: Option<Vec<AttachmentInput>>,
}
