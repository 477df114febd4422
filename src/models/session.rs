//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Session entity recording one sign-in from a client device.
///
/// Sessions are append-only: every successful sign-in inserts a new row and
/// nothing in the sign-in path removes older ones (unless single-session
/// mode is enabled in the configuration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owning user ID
    pub user_id: String,
    /// Client user agent string
    pub user_agent: String,
    /// Client platform
    pub platform: SessionPlatform,
    /// Client IP address
    pub ip_address: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new Session with a freshly generated id.
    pub fn new(
        user_id: String,
        user_agent: String,
        platform: SessionPlatform,
        ip_address: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            user_agent,
            platform,
            ip_address,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Client platform a session was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPlatform {
    Web,
    Mobile,
    AdminPanel,
}

impl Default for SessionPlatform {
    fn default() -> Self {
        Self::Web
    }
}

impl fmt::Display for SessionPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPlatform::Web => write!(f, "web"),
            SessionPlatform::Mobile => write!(f, "mobile"),
            SessionPlatform::AdminPanel => write!(f, "admin_panel"),
        }
    }
}

impl FromStr for SessionPlatform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(SessionPlatform::Web),
            "mobile" => Ok(SessionPlatform::Mobile),
            "admin_panel" => Ok(SessionPlatform::AdminPanel),
            _ => Err(anyhow::anyhow!("Invalid session platform: {}", s)),
        }
    }
}

/// Input for creating a session at sign-in time
#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    /// Owning user ID
    pub user_id: String,
    /// Client user agent string
    pub user_agent: String,
    /// Client platform
    pub platform: SessionPlatform,
    /// Client IP address
    pub ip_address: String,
}

/// Input for updating a session
#[derive(Debug, Clone, Default)]
pub struct UpdateSessionInput {
    /// New user agent (optional)
    pub user_agent: Option<String>,
    /// New platform (optional)
    pub platform: Option<SessionPlatform>,
    /// New IP address (optional)
    pub ip_address: Option<String>,
}
