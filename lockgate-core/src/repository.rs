//! Storage traits for attempt records and lock state.
//!
//! Both stores are externally provided, shared services. The core holds no
//! locks of its own and performs no read-modify-write critical section across
//! the two stores; each store's own atomicity is relied upon. Implementations
//! must respect caller-supplied deadlines on I/O, surfacing expiry as
//! [`StoreError::Timeout`] rather than waiting unboundedly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    attempt::{AttemptFilter, FailedAttempt},
    error::StoreError,
};

/// Append-only record store of failed authentication attempts.
///
/// No ordering guarantee is required beyond timestamp comparison; concurrent
/// appends for different identities must not interfere with each other.
#[async_trait]
pub trait AttemptLog: Send + Sync + 'static {
    /// Durably record one attempt.
    ///
    /// Exactly one record per call. A record must never be silently dropped:
    /// on transient failure, return a [`StoreError`] so the caller knows the
    /// attempt may not have been recorded.
    async fn append(&self, attempt: &FailedAttempt) -> Result<(), StoreError>;

    /// Count attempts for `identity` with `occurred_at >= cutoff`.
    ///
    /// The lower bound is closed: an attempt stamped exactly at `cutoff`
    /// counts. Must be consistent with `append` — an attempt appended before
    /// this call, with no concurrent interference, is included.
    async fn count_since(&self, identity: &str, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// List attempts matching `filter`, most recent first.
    ///
    /// Supports the operator surface (listing and searching the attempt
    /// history); never used in the lock decision.
    async fn find(&self, filter: &AttemptFilter) -> Result<Vec<FailedAttempt>, StoreError>;
}

/// Key-value store holding, per identity, an optional lock expiry.
///
/// TTL-capable backends may let entries expire automatically instead of
/// comparing `until` explicitly, provided the effective semantics match.
#[async_trait]
pub trait LockStore: Send + Sync + 'static {
    /// Set or overwrite the lock expiry for `identity`.
    ///
    /// Idempotent overwrite: two concurrent calls for the same identity
    /// converge to some valid `until`, which is acceptable because both
    /// represent "lock now" at nearly the same time.
    async fn set_lock(&self, identity: &str, until: DateTime<Utc>) -> Result<(), StoreError>;

    /// Remove any lock state for `identity`. A no-op when none exists.
    async fn clear_lock(&self, identity: &str) -> Result<(), StoreError>;

    /// True iff a lock exists for `identity` with `until > now`.
    async fn is_locked(&self, identity: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// The raw lock expiry for `identity`, if any, expired or not.
    ///
    /// For status reporting; lock decisions go through `is_locked`.
    async fn locked_until(&self, identity: &str) -> Result<Option<DateTime<Utc>>, StoreError>;
}
