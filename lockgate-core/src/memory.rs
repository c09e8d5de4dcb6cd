//! In-memory storage backends.
//!
//! Process-local implementations of [`AttemptLog`] and [`LockStore`], suitable
//! for single-process deployments and tests. State is not shared across
//! processes and does not survive restarts; multi-node deployments should use
//! a shared backend instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::{
    attempt::{AttemptFilter, FailedAttempt},
    error::StoreError,
    repository::{AttemptLog, LockStore},
};

/// Append-only attempt log backed by a concurrent map keyed by identity.
///
/// Appends for different identities touch different map entries and never
/// interfere.
#[derive(Debug, Default)]
pub struct MemoryAttemptLog {
    attempts: DashMap<String, Vec<FailedAttempt>>,
}

impl MemoryAttemptLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptLog for MemoryAttemptLog {
    async fn append(&self, attempt: &FailedAttempt) -> Result<(), StoreError> {
        self.attempts
            .entry(attempt.identity.clone())
            .or_default()
            .push(attempt.clone());
        Ok(())
    }

    async fn count_since(&self, identity: &str, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self
            .attempts
            .get(identity)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|a| a.occurred_at >= cutoff)
                    .count() as u64
            })
            .unwrap_or(0))
    }

    async fn find(&self, filter: &AttemptFilter) -> Result<Vec<FailedAttempt>, StoreError> {
        let mut matching: Vec<FailedAttempt> = self
            .attempts
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|a| filter.matches(a))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();

        matching.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }
}

/// TTL-style lock store backed by a concurrent map of lock expiries.
///
/// Expired entries are removed lazily when read; a read after expiry behaves
/// exactly as if the entry had been deleted.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    locks: DashMap<String, DateTime<Utc>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn set_lock(&self, identity: &str, until: DateTime<Utc>) -> Result<(), StoreError> {
        self.locks.insert(identity.to_string(), until);
        Ok(())
    }

    async fn clear_lock(&self, identity: &str) -> Result<(), StoreError> {
        self.locks.remove(identity);
        Ok(())
    }

    async fn is_locked(&self, identity: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        match self.locks.get(identity).map(|entry| *entry.value()) {
            Some(until) if until > now => Ok(true),
            Some(_) => {
                // expired; sweep it so the map does not accumulate stale keys
                self.locks
                    .remove_if(identity, |_, until| *until <= now);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn locked_until(&self, identity: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.locks.get(identity).map(|entry| *entry.value()))
    }
}
