//! The guard that wraps an external authenticator with lockout bookkeeping.
//!
//! [`AuthenticationGuard`] composes with an injected [`Authenticator`] via
//! trait dispatch: pre-check the lock, delegate, record the failure, re-check.
//! "Locked" is an explicit [`GuardOutcome`] variant returned by value, not an
//! error to unwind through.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error,
    context::RequestContext,
    engine::LockoutEngine,
    repository::{AttemptLog, LockStore},
};

/// Generic user-facing message for a locked account.
///
/// Deliberately vague: it reveals neither remaining attempts nor the exact
/// unlock time, so it does not help an attacker pace their guesses.
pub const LOCKED_MESSAGE: &str = "This account is locked, please try again in a few minutes.";

/// Result of one credential verification by the external [`Authenticator`].
///
/// Anything that is not a `Success` principal is a `Failure` — an unknown
/// identity and a wrong password are indistinguishable here, and both count
/// toward lockout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome<P> {
    Success(P),
    Failure,
}

/// External credential verification capability.
///
/// The guard never inspects credentials or principals; both are associated
/// types owned by the host application. Infrastructure failures inside the
/// authenticator surface as `Err` and bypass lockout bookkeeping — only a
/// definitive `Failure` outcome counts as a failed attempt.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    type Credentials: Send + Sync;
    type Principal: Send;

    async fn attempt(
        &self,
        identity: &str,
        credentials: &Self::Credentials,
        context: &RequestContext,
    ) -> Result<AuthOutcome<Self::Principal>, Error>;
}

/// Final outcome of a guarded authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome<P> {
    /// Credentials verified; the identity was not locked.
    Success(P),
    /// Credentials rejected; the identity is still below the lock threshold.
    Failure,
    /// The identity was already locked. The authenticator was not invoked.
    Blocked,
    /// Credentials rejected and this failure tripped the lock threshold.
    ///
    /// Distinct from [`GuardOutcome::Failure`] so the caller can present
    /// "account locked" rather than "invalid credentials".
    BlockedAfterAttempt,
}

impl<P> GuardOutcome<P> {
    /// The identity is locked as of this outcome.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked | Self::BlockedAfterAttempt)
    }

    /// The generic user-facing message for blocked outcomes.
    pub fn user_message(&self) -> Option<&'static str> {
        self.is_blocked().then_some(LOCKED_MESSAGE)
    }
}

/// Wraps an [`Authenticator`] with pre-check / record-failure / re-check.
pub struct AuthenticationGuard<Auth, A, L>
where
    Auth: Authenticator,
    A: AttemptLog,
    L: LockStore,
{
    authenticator: Arc<Auth>,
    engine: Arc<LockoutEngine<A, L>>,
}

impl<Auth, A, L> AuthenticationGuard<Auth, A, L>
where
    Auth: Authenticator,
    A: AttemptLog,
    L: LockStore,
{
    pub fn new(authenticator: Arc<Auth>, engine: Arc<LockoutEngine<A, L>>) -> Self {
        Self {
            authenticator,
            engine,
        }
    }

    pub fn engine(&self) -> &LockoutEngine<A, L> {
        &self.engine
    }

    /// Run one authentication attempt under lockout protection.
    ///
    /// An empty identity bypasses lockout bookkeeping entirely and is handed
    /// straight to the authenticator: the guard only applies when an identity
    /// is named. A locked identity is rejected before the authenticator runs,
    /// so a locked account leaks no timing signal about credential validity
    /// and adds no downstream load.
    pub async fn guarded_attempt(
        &self,
        identity: &str,
        credentials: &Auth::Credentials,
        context: &RequestContext,
    ) -> Result<GuardOutcome<Auth::Principal>, Error> {
        if identity.is_empty() {
            return Ok(self
                .authenticator
                .attempt(identity, credentials, context)
                .await?
                .into());
        }

        if self.engine.is_locked(identity).await? {
            tracing::debug!(identity, "Rejected attempt for locked account");
            return Ok(GuardOutcome::Blocked);
        }

        match self
            .authenticator
            .attempt(identity, credentials, context)
            .await?
        {
            AuthOutcome::Success(principal) => Ok(GuardOutcome::Success(principal)),
            AuthOutcome::Failure => {
                let result = self.engine.record_failure(identity, context).await?;
                if result.now_locked {
                    Ok(GuardOutcome::BlockedAfterAttempt)
                } else {
                    Ok(GuardOutcome::Failure)
                }
            }
        }
    }
}

impl<P> From<AuthOutcome<P>> for GuardOutcome<P> {
    fn from(outcome: AuthOutcome<P>) -> Self {
        match outcome {
            AuthOutcome::Success(principal) => GuardOutcome::Success(principal),
            AuthOutcome::Failure => GuardOutcome::Failure,
        }
    }
}
