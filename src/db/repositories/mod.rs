//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod attachment;
pub mod business;
pub mod category;
pub mod review;
pub mod session;
pub mod user;

pub use attachment::{AttachmentRepository, AttachmentTable, SqlxAttachmentRepository};
pub use business::{BusinessRepository, SqlxBusinessRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use review::{ReviewRepository, SqlxReviewRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
