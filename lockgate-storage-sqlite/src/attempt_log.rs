//! SQLite implementation of the attempt log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lockgate_core::{
    AttemptFilter, AttemptLog, FailedAttempt,
    error::StoreError,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Append-only attempt log backed by the `failed_attempts` table.
pub struct SqliteAttemptLog {
    pool: SqlitePool,
}

impl SqliteAttemptLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteFailedAttempt {
    identity: String,
    source_address: String,
    agent: String,
    occurred_at: i64,
}

impl From<SqliteFailedAttempt> for FailedAttempt {
    fn from(row: SqliteFailedAttempt) -> Self {
        FailedAttempt {
            identity: row.identity,
            source_address: row.source_address,
            agent: row.agent,
            occurred_at: DateTime::from_timestamp(row.occurred_at, 0).expect("Invalid timestamp"),
        }
    }
}

#[async_trait]
impl AttemptLog for SqliteAttemptLog {
    async fn append(&self, attempt: &FailedAttempt) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO failed_attempts (identity, source_address, agent, occurred_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&attempt.identity)
        .bind(&attempt.source_address)
        .bind(&attempt.agent)
        .bind(attempt.occurred_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to record failed attempt");
            StoreError::Database("Failed to record failed attempt".to_string())
        })?;

        Ok(())
    }

    async fn count_since(&self, identity: &str, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        // closed lower bound: an attempt stamped exactly at the cutoff counts
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM failed_attempts
            WHERE identity = ? AND occurred_at >= ?
            "#,
        )
        .bind(identity)
        .bind(cutoff.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count failed attempts");
            StoreError::Database("Failed to count failed attempts".to_string())
        })?;

        Ok(count as u64)
    }

    async fn find(&self, filter: &AttemptFilter) -> Result<Vec<FailedAttempt>, StoreError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT identity, source_address, agent, occurred_at FROM failed_attempts WHERE 1=1",
        );

        if let Some(identity) = &filter.identity {
            query.push(" AND identity = ").push_bind(identity);
        }
        if let Some(address) = &filter.source_address {
            query
                .push(" AND source_address LIKE ")
                .push_bind(format!("%{address}%"));
        }
        if let Some(agent) = &filter.agent {
            query.push(" AND agent LIKE ").push_bind(format!("%{agent}%"));
        }
        if let Some(since) = filter.since {
            query.push(" AND occurred_at >= ").push_bind(since.timestamp());
        }
        if let Some(until) = filter.until {
            query.push(" AND occurred_at <= ").push_bind(until.timestamp());
        }

        query.push(" ORDER BY occurred_at DESC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = query
            .build_query_as::<SqliteFailedAttempt>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to list failed attempts");
                StoreError::Database("Failed to list failed attempts".to_string())
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
