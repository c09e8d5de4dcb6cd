//! The lockout decision engine.
//!
//! [`LockoutEngine`] orchestrates an [`AttemptLog`], a [`LockStore`], and a
//! [`LockoutPolicy`] to answer "is this identity locked?", record failures,
//! and impose or clear locks. Per identity it is a two-state machine,
//! `Unlocked` / `Locked(until)`: recording a failure that brings the window
//! count to the threshold moves to `Locked(now + lock_duration)`; a lock
//! expires by time or by explicit unlock; recording while locked appends but
//! never extends the existing lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    Error,
    attempt::FailedAttempt,
    context::RequestContext,
    policy::LockoutPolicy,
    repository::{AttemptLog, LockStore},
};

/// Outcome of recording one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockResult {
    /// The identity was locked before this failure was recorded.
    pub already_locked: bool,
    /// The identity is locked after this failure was recorded, either because
    /// it already was or because this failure tripped the threshold.
    pub now_locked: bool,
}

impl LockResult {
    /// This failure is the one that tripped the threshold.
    pub fn just_locked(&self) -> bool {
        self.now_locked && !self.already_locked
    }
}

/// Point-in-time lockout state for one identity.
///
/// Carries precise data for logging and operator tooling. User-facing
/// messaging must stay generic: never surface `recent_failures` or
/// `locked_until` to the client being throttled.
#[derive(Debug, Clone, Serialize)]
pub struct LockoutStatus {
    pub identity: String,
    /// Failures recorded within the trailing window.
    pub recent_failures: u64,
    pub is_locked: bool,
    /// Lock expiry when locked; `None` otherwise.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    /// Seconds until the lock expires, or `None` when not locked.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        self.locked_until
            .filter(|_| self.is_locked)
            .map(|until| (until - Utc::now()).num_seconds().max(0))
    }
}

/// Orchestrates attempt recording and lock transitions.
///
/// Thread-safe and cheap to share; the engine introduces no internal threads,
/// timers, or background workers, and holds no locks of its own. Store errors
/// are propagated to the caller, never mapped onto a lock decision.
pub struct LockoutEngine<A: AttemptLog, L: LockStore> {
    attempts: Arc<A>,
    locks: Arc<L>,
    policy: LockoutPolicy,
}

impl<A: AttemptLog, L: LockStore> LockoutEngine<A, L> {
    pub fn new(attempts: Arc<A>, locks: Arc<L>, policy: LockoutPolicy) -> Self {
        Self {
            attempts,
            locks,
            policy,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    pub fn attempt_log(&self) -> Arc<A> {
        self.attempts.clone()
    }

    pub fn lock_store(&self) -> Arc<L> {
        self.locks.clone()
    }

    /// Whether `identity` is currently locked.
    pub async fn is_locked(&self, identity: &str) -> Result<bool, Error> {
        Ok(self.locks.is_locked(identity, Utc::now()).await?)
    }

    /// Record one failed attempt and apply the lockout policy.
    ///
    /// Appends exactly one [`FailedAttempt`] regardless of lock state, counts
    /// failures in the trailing window (closed lower bound), and imposes a
    /// lock when the policy fires and the identity was not already locked. An
    /// existing lock is never extended or shortened.
    pub async fn record_failure(
        &self,
        identity: &str,
        context: &RequestContext,
    ) -> Result<LockResult, Error> {
        let attempt = FailedAttempt::new(identity, context);
        let now = attempt.occurred_at;

        self.attempts.append(&attempt).await?;
        tracing::debug!(identity, "Recorded failed authentication attempt");

        let cutoff = now - self.policy.window();
        let recent = self.attempts.count_since(identity, cutoff).await?;

        let already_locked = self.locks.is_locked(identity, now).await?;
        let should_lock = self.policy.should_lock(recent);

        if should_lock && !already_locked {
            let until = now + self.policy.lock_duration_for(identity);
            self.locks.set_lock(identity, until).await?;
            tracing::info!(
                identity,
                recent_failures = recent,
                locked_until = %until,
                "Account locked after repeated failed attempts"
            );
        }

        Ok(LockResult {
            already_locked,
            now_locked: already_locked || should_lock,
        })
    }

    /// Impose a lock on `identity` for the configured duration, starting now.
    pub async fn lock(&self, identity: &str) -> Result<(), Error> {
        let until = Utc::now() + self.policy.lock_duration_for(identity);
        self.locks.set_lock(identity, until).await?;
        tracing::info!(identity, locked_until = %until, "Account locked");
        Ok(())
    }

    /// Clear any lock on `identity`. A no-op when not locked.
    pub async fn unlock(&self, identity: &str) -> Result<(), Error> {
        self.locks.clear_lock(identity).await?;
        tracing::info!(identity, "Account unlocked");
        Ok(())
    }

    /// Point-in-time status for `identity`, for logging and operator tooling.
    pub async fn status(&self, identity: &str) -> Result<LockoutStatus, Error> {
        let now = Utc::now();
        let recent = self
            .attempts
            .count_since(identity, now - self.policy.window())
            .await?;
        let is_locked = self.locks.is_locked(identity, now).await?;
        let locked_until = if is_locked {
            self.locks.locked_until(identity).await?
        } else {
            None
        };

        Ok(LockoutStatus {
            identity: identity.to_string(),
            recent_failures: recent,
            is_locked,
            locked_until,
        })
    }
}
