//! Attachment model
//!
//! One attachment shape serves both `business_attachments` and
//! `review_attachments`; the parent id column differs per table but the
//! lifecycle (upsert synchronization) is identical.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Photo or video file reference bound to a business or review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owning business or review id, never serialized
    #[serde(skip)]
    pub parent_id: String,
    /// Stored file path
    pub filepath: String,
    /// Media kind
    pub content_type: AttachmentKind,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Attachment {
    /// Create a new Attachment with a freshly generated id.
    pub fn new(parent_id: String, filepath: String, content_type: AttachmentKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            parent_id,
            filepath,
            content_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Media kind of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Photo,
    Video,
}

impl Default for AttachmentKind {
    fn default() -> Self {
        Self::Photo
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentKind::Photo => write!(f, "photo"),
            AttachmentKind::Video => write!(f, "video"),
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "photo" => Ok(AttachmentKind::Photo),
            "video" => Ok(AttachmentKind::Video),
            _ => Err(anyhow::anyhow!("Invalid attachment kind: {}", s)),
        }
    }
}

/// Submitted attachment descriptor for upsert synchronization.
///
/// An item without an id (or with an empty one) is treated as new and gets
/// a freshly generated id at insert time; an item with an id marks an
/// existing row that must be kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentInput {
    /// Existing row id, absent for new attachments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Stored file path
    pub filepath: String,
    /// Media kind
    pub content_type: AttachmentKind,
}

impl AttachmentInput {
    /// Create a descriptor for a new attachment.
    pub fn new(filepath: impl Into<String>, content_type: AttachmentKind) -> Self {
        Self {
            id: None,
            filepath: filepath.into(),
            content_type,
        }
    }

    /// Create a descriptor referencing an existing row.
    pub fn existing(id: impl Into<String>, filepath: impl Into<String>, content_type: AttachmentKind) -> Self {
        Self {
            id: Some(id.into()),
            filepath: filepath.into(),
            content_type,
        }
    }

    /// Whether this descriptor marks a new attachment (no id yet).
    pub fn is_new(&self) -> bool {
        self.id.as_deref().map_or(true, str::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_new() {
        let attachment = Attachment::new(
            "business-1".to_string(),
            "/uploads/a.jpg".to_string(),
            AttachmentKind::Photo,
        );

        assert!(!attachment.id.is_empty());
        assert_eq!(attachment.parent_id, "business-1");
        assert_eq!(attachment.content_type, AttachmentKind::Photo);
    }

    #[test]
    fn test_parent_id_not_serialized() {
        let attachment = Attachment::new(
            "business-1".to_string(),
            "/uploads/a.jpg".to_string(),
            AttachmentKind::Photo,
        );
        let json = serde_json::to_string(&attachment).unwrap();

        assert!(!json.contains("business-1"));
        assert!(!json.contains("parent_id"));
    }

    #[test]
    fn test_input_is_new() {
        assert!(AttachmentInput::new("/a.jpg", AttachmentKind::Photo).is_new());
        assert!(!AttachmentInput::existing("id-1", "/a.jpg", AttachmentKind::Photo).is_new());

        // An empty id string counts as new as well
        let empty = AttachmentInput {
            id: Some(String::new()),
            filepath: "/a.jpg".to_string(),
            content_type: AttachmentKind::Photo,
        };
        assert!(empty.is_new());
    }

    #[test]
    fn test_kind_display_and_from_str() {
        assert_eq!(AttachmentKind::Photo.to_string(), "photo");
        assert_eq!(AttachmentKind::Video.to_string(), "video");
        assert_eq!(AttachmentKind::from_str("VIDEO").unwrap(), AttachmentKind::Video);
        assert!(AttachmentKind::from_str("audio").is_err());
    }

    #[test]
    fn test_input_deserialize_without_id() {
        let input: AttachmentInput =
            serde_json::from_str(r#"{"filepath":"/a.jpg","content_type":"photo"}"#).unwrap();

        assert!(input.is_new());
        assert_eq!(input.filepath, "/a.jpg");
    }
}
