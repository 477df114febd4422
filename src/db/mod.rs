//! Database layer.
//!
//! Storage runs on either SQLite (the default, good for a single-binary
//! deployment) or MySQL, selected by configuration. The layer splits into:
//!
//! - [`pool`]: the [`DatabasePool`] trait and its two driver impls
//! - [`migrations`]: code-defined schema migrations with per-driver SQL
//! - [`query`]: the list-query builder shared by every paginated read
//! - [`repositories`]: one repository per entity, dispatching on the driver
//!
//! A typical startup opens the pool and brings the schema up to date:
//!
//! ```ignore
//! let pool = db::create_pool(&config.database).await?;
//! db::migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod query;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
