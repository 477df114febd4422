//! User entity and the account enums (type, role, gender, status) used
//! throughout the review platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// User entity representing a registered account.
///
/// Accounts carry two classifications: a `user_type` describing what kind of
/// account this is, and a `role` consumed by the policy enforcer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Account type
    pub user_type: UserType,
    /// Authorization role
    pub role: UserRole,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Argon2id hash of the password, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Short profile text
    pub bio: Option<String>,
    /// Gender
    pub gender: Gender,
    /// Profile picture URL
    pub profile_picture: Option<String>,
    /// Account status
    pub status: UserStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with a freshly generated id.
    ///
    /// Callers hash the password first; this takes the finished hash.
    pub fn new(name: String, email: String, password_hash: String, gender: Gender) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_type: UserType::User,
            role: UserRole::User,
            name,
            email,
            password_hash,
            bio: None,
            gender,
            profile_picture: None,
            status: UserStatus::Inverify,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator (super admins included)
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::SuperAdmin)
    }

    /// Check if the user is a business owner
    pub fn is_business_owner(&self) -> bool {
        self.role == UserRole::BusinessOwner
    }

    /// Check if the user can modify a resource owned by `owner_id`
    ///
    /// Admins can modify any resource.
    /// Everyone else can only modify resources they own.
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.is_admin() || self.id == owner_id
    }

    /// Check if the account is blocked
    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Blocked
    }

    /// Check if the account has completed a sign-in
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Account type.
///
/// Distinguishes what kind of account this is, independent of the
/// authorization role:
/// - User: regular account
/// - Admin: staff account
/// - BusinessOwner: account that manages business listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// Regular account
    User,
    /// Staff account
    Admin,
    /// Account that manages business listings
    BusinessOwner,
}

impl Default for UserType {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::User => write!(f, "user"),
            UserType::Admin => write!(f, "admin"),
            UserType::BusinessOwner => write!(f, "business_owner"),
        }
    }
}

impl FromStr for UserType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserType::User),
            "admin" => Ok(UserType::Admin),
            "business_owner" => Ok(UserType::BusinessOwner),
            _ => Err(anyhow::anyhow!("Invalid user type: {}", s)),
        }
    }
}

/// Account role consulted by the policy table.
///
/// Roles determine what routes the policy enforcer lets a user reach:
/// - User: regular access
/// - Admin: management access
/// - SuperAdmin: full access
/// - BusinessOwner: can manage own business listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular access
    User,
    /// Management access
    Admin,
    /// Full access
    SuperAdmin,
    /// Can manage own business listings
    BusinessOwner,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
            UserRole::SuperAdmin => write!(f, "super_admin"),
            UserRole::BusinessOwner => write!(f, "business_owner"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            "super_admin" => Ok(UserRole::SuperAdmin),
            "business_owner" => Ok(UserRole::BusinessOwner),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Gender recorded at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Default for Gender {
    fn default() -> Self {
        Self::Male
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(anyhow::anyhow!("Invalid gender: {}", s)),
        }
    }
}

/// Account lifecycle state.
///
/// Status determines whether an account is usable:
/// - Inverify: registered but never signed in
/// - Active: normal access
/// - Blocked: cannot sign in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Registered but never signed in
    Inverify,
    /// Normal access
    Active,
    /// Cannot sign in
    Blocked,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Inverify
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Inverify => write!(f, "inverify"),
            UserStatus::Active => write!(f, "active"),
            UserStatus::Blocked => write!(f, "blocked"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inverify" => Ok(UserStatus::Inverify),
            "active" => Ok(UserStatus::Active),
            "blocked" => Ok(UserStatus::Blocked),
            _ => Err(anyhow::anyhow!("Invalid user status: {}", s)),
        }
    }
}

/// Fields accepted at registration, password still plaintext
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Plaintext password, hashed by the user service
    pub password: String,
    /// Gender
    pub gender: Gender,
}

/// Optional replacement fields for a profile update
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New display name (optional)
    pub name: Option<String>,
    /// New email (optional)
    pub email: Option<String>,
    /// New password (optional, will be hashed)
    pub password: Option<String>,
    /// New bio (optional)
    pub bio: Option<String>,
    /// New profile picture URL (optional)
    pub profile_picture: Option<String>,
    /// New role (optional)
    pub role: Option<UserRole>,
    /// New account type (optional)
    pub user_type: Option<UserType>,
    /// New status (optional)
    pub status: Option<UserStatus>,
}
