//! ACS Store - Durable entity persistence
//!
//! Storage adapters for:
//! - Badges, employees, groups and resources
//! - Group membership and group grants (as join tables)
//! - The access log
//!
//! ## Architecture
//!
//! This crate implements the `IEntityStore` port from `acs-core`. It is a
//! driven (secondary) adapter in the hexagonal architecture. Two
//! implementations are provided and chosen at composition time:
//!
//! - [`SqliteEntityStore`] - durable, backed by a [`DatabasePool`]
//! - [`InMemoryEntityStore`] - ephemeral, for tests and dry runs
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use acs_store::{DatabasePool, SqliteEntityStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/var/lib/acs/acs.db")).await?;
//! let store = SqliteEntityStore::new(pool.pool().clone());
//! // Use store as IEntityStore...
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod pool;
pub mod sqlite;

pub use memory::InMemoryEntityStore;
pub use pool::DatabasePool;
pub use sqlite::SqliteEntityStore;

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be converted back into a domain type
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An in-memory store lock was poisoned by a panicking writer
    #[error("Store lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::QueryFailed(e.to_string())
    }
}
