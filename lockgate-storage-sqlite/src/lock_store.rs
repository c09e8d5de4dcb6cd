//! SQLite implementation of the lock store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lockgate_core::{LockStore, error::StoreError};
use sqlx::SqlitePool;

/// Lock store backed by the `account_locks` table, one row per identity.
///
/// There is no TTL machinery in SQLite, so expiry is enforced by comparing
/// `locked_until` against the caller-supplied `now`; expired rows for the
/// queried identity are swept opportunistically on read.
pub struct SqliteLockStore {
    pool: SqlitePool,
}

impl SqliteLockStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockStore for SqliteLockStore {
    async fn set_lock(&self, identity: &str, until: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO account_locks (identity, locked_until)
            VALUES (?, ?)
            ON CONFLICT(identity) DO UPDATE SET locked_until = excluded.locked_until
            "#,
        )
        .bind(identity)
        .bind(until.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to set lock");
            StoreError::Database("Failed to set lock".to_string())
        })?;

        Ok(())
    }

    async fn clear_lock(&self, identity: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM account_locks WHERE identity = ?")
            .bind(identity)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to clear lock");
                StoreError::Database("Failed to clear lock".to_string())
            })?;

        Ok(())
    }

    async fn is_locked(&self, identity: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT locked_until FROM account_locks WHERE identity = ?")
                .bind(identity)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to read lock state");
                    StoreError::Database("Failed to read lock state".to_string())
                })?;

        match row {
            Some((until,)) if until > now.timestamp() => Ok(true),
            Some(_) => {
                // expired; sweep it so the table does not accumulate stale
                // rows. The common unlocked path above stays read-only.
                sqlx::query("DELETE FROM account_locks WHERE identity = ? AND locked_until <= ?")
                    .bind(identity)
                    .bind(now.timestamp())
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "Failed to sweep expired lock");
                        StoreError::Database("Failed to sweep expired lock".to_string())
                    })?;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn locked_until(&self, identity: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT locked_until FROM account_locks WHERE identity = ?")
                .bind(identity)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to read lock expiry");
                    StoreError::Database("Failed to read lock expiry".to_string())
                })?;

        Ok(row.and_then(|(ts,)| DateTime::from_timestamp(ts, 0)))
    }
}
