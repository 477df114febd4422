//! Data models
//!
//! This module contains all data structures used throughout the review platform.
//! Models represent:
//! - Database entities (User, Session, Business, BusinessCategory, Attachment, Review)
//! - Shared list-query request/result types
//! - Internal data transfer objects

mod attachment;
mod business;
mod category;
mod list;
mod review;
mod session;
mod user;

pub use attachment::{Attachment, AttachmentInput, AttachmentKind};
pub use business::{Business, ContactInfo, CreateBusinessInput, HoursOfOperation, UpdateBusinessInput};
pub use category::{BusinessCategory, CreateCategoryInput, UpdateCategoryInput};
pub use list::{Filter, FilterKind, ListParams, OrderBy, OrderDirection, PagedResult};
pub use review::{CreateReviewInput, Review, UpdateReviewInput};
pub use session::{CreateSessionInput, Session, SessionPlatform, UpdateSessionInput};
pub use user::{CreateUserInput, Gender, UpdateUserInput, User, UserRole, UserStatus, UserType};
