//! Versioned schema migrations for the SQLite backend.
//!
//! Applied migrations are tracked in a `_lockgate_migrations` table; each
//! migration runs inside a transaction together with its tracking row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait SqliteMigration: Send + Sync {
    /// Execute the migration
    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;

    /// Rollback the migration
    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;

    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;
}

/// All lockgate migrations, in application order.
pub fn all() -> Vec<Box<dyn SqliteMigration>> {
    vec![
        Box::new(CreateFailedAttemptsTable),
        Box::new(CreateAccountLocksTable),
        Box::new(CreateFailedAttemptsIndexes),
    ]
}

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    const MIGRATION_TABLE: &'static str = "_lockgate_migrations";

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the migration tracking table.
    pub async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(
            format!(
                r#"
            CREATE TABLE IF NOT EXISTS {} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
                Self::MIGRATION_TABLE
            )
            .as_str(),
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply pending migrations.
    pub async fn up(&self, migrations: &[Box<dyn SqliteMigration>]) -> Result<(), MigrationError> {
        for migration in migrations {
            if !self.is_applied(migration.version()).await? {
                let mut tx = self.pool.begin().await?;

                tracing::info!(
                    "Applying migration {} ({})",
                    migration.name(),
                    migration.version()
                );

                migration.up(&mut *tx).await?;

                sqlx::query(
                    format!(
                        "INSERT INTO {} (version, name, applied_at) VALUES (?, ?, ?)",
                        Self::MIGRATION_TABLE
                    )
                    .as_str(),
                )
                .bind(migration.version())
                .bind(migration.name())
                .bind(Utc::now().timestamp())
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
            }
        }
        Ok(())
    }

    /// Rollback applied migrations.
    pub async fn down(
        &self,
        migrations: &[Box<dyn SqliteMigration>],
    ) -> Result<(), MigrationError> {
        for migration in migrations {
            if self.is_applied(migration.version()).await? {
                let mut tx = self.pool.begin().await?;

                tracing::info!(
                    "Rolling back migration {} ({})",
                    migration.name(),
                    migration.version()
                );

                migration.down(&mut *tx).await?;

                sqlx::query(
                    format!("DELETE FROM {} WHERE version = ?", Self::MIGRATION_TABLE).as_str(),
                )
                .bind(migration.version())
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
            }
        }
        Ok(())
    }

    /// Check if a specific migration version was applied.
    pub async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let applied: bool = sqlx::query_scalar(
            format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE version = ?)",
                Self::MIGRATION_TABLE
            )
            .as_str(),
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied)
    }
}

pub struct CreateFailedAttemptsTable;

#[async_trait]
impl SqliteMigration for CreateFailedAttemptsTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "create_failed_attempts_table"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE failed_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identity TEXT NOT NULL,
                source_address TEXT NOT NULL DEFAULT '',
                agent TEXT NOT NULL DEFAULT '',
                occurred_at INTEGER NOT NULL
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE failed_attempts").execute(conn).await?;
        Ok(())
    }
}

pub struct CreateAccountLocksTable;

#[async_trait]
impl SqliteMigration for CreateAccountLocksTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "create_account_locks_table"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE account_locks (
                identity TEXT PRIMARY KEY,
                locked_until INTEGER NOT NULL
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE account_locks").execute(conn).await?;
        Ok(())
    }
}

pub struct CreateFailedAttemptsIndexes;

#[async_trait]
impl SqliteMigration for CreateFailedAttemptsIndexes {
    fn version(&self) -> i64 {
        3
    }

    fn name(&self) -> &str {
        "create_failed_attempts_indexes"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        // window counts are a range scan over (identity, occurred_at)
        sqlx::query(
            "CREATE INDEX idx_failed_attempts_identity_occurred_at
             ON failed_attempts(identity, occurred_at)",
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP INDEX idx_failed_attempts_identity_occurred_at")
            .execute(conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test() {
        let _ = tracing_subscriber::fmt().try_init();
    }

    #[tokio::test]
    async fn test_migrations_apply_once() {
        setup_test();
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create pool");
        let manager = SqliteMigrationManager::new(pool.clone());
        manager.initialize().await.expect("Failed to initialize");

        manager.up(&all()).await.expect("Failed to migrate");
        // re-applying is a no-op, not an error
        manager.up(&all()).await.expect("Failed to re-run migrate");

        assert!(manager.is_applied(1).await.unwrap());
        assert!(manager.is_applied(2).await.unwrap());
        assert!(manager.is_applied(3).await.unwrap());
        assert!(!manager.is_applied(99).await.unwrap());
    }

    #[tokio::test]
    async fn test_down_rolls_back() {
        setup_test();
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create pool");
        let manager = SqliteMigrationManager::new(pool.clone());
        manager.initialize().await.expect("Failed to initialize");
        manager.up(&all()).await.expect("Failed to migrate");

        let mut reversed = all();
        reversed.reverse();
        manager.down(&reversed).await.expect("Failed to roll back");

        assert!(!manager.is_applied(1).await.unwrap());
    }
}
