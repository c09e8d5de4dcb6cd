//! SQLite storage backend for lockgate.
//!
//! Implements [`AttemptLog`](lockgate_core::AttemptLog) and
//! [`LockStore`](lockgate_core::LockStore) on top of a shared
//! [`SqlitePool`], with versioned schema migrations. Timestamps are stored
//! as unix seconds since no database can agree on a datetime type.
//!
//! ```rust,no_run
//! use lockgate_storage_sqlite::{SqliteAttemptLog, SqliteLockStore, migrate};
//! use sqlx::SqlitePool;
//!
//! # async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = SqlitePool::connect("sqlite://lockgate.db").await?;
//! migrate(&pool).await?;
//!
//! let attempts = SqliteAttemptLog::new(pool.clone());
//! let locks = SqliteLockStore::new(pool);
//! # Ok(())
//! # }
//! ```

mod attempt_log;
mod lock_store;
pub mod migrations;

pub use attempt_log::SqliteAttemptLog;
pub use lock_store::SqliteLockStore;
pub use migrations::{MigrationError, SqliteMigrationManager};

use sqlx::SqlitePool;

/// Apply all pending lockgate migrations to `pool`.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrationError> {
    let manager = SqliteMigrationManager::new(pool.clone());
    manager.initialize().await?;
    manager.up(&migrations::all()).await
}
