//! # Lockgate
//!
//! Lockgate is an account lockout guard for Rust authentication pipelines. It
//! tracks failed authentication attempts per identity within a sliding time
//! window and temporarily locks an identity once the failure count in that
//! window reaches a threshold, protecting a login endpoint from
//! credential-guessing attacks without permanently disabling accounts.
//!
//! Lockgate never verifies credentials itself: it wraps an
//! [`Authenticator`] you supply, and only decides whether an attempt is
//! allowed to reach it.
//!
//! ## Storage Support
//!
//! Lockgate currently supports the following storage backends:
//! - In-memory (process-local, built into the core)
//! - SQLite (`sqlite` feature)
//!
//! Any other backend can be plugged in by implementing the [`AttemptLog`]
//! and [`LockStore`] traits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lockgate::{Lockgate, LockoutConfig, RequestContext};
//!
//! # use std::sync::Arc;
//! # use async_trait::async_trait;
//! # use lockgate::{AuthOutcome, Authenticator, Error};
//! # struct MyAuthenticator;
//! # #[async_trait]
//! # impl Authenticator for MyAuthenticator {
//! #     type Credentials = String;
//! #     type Principal = String;
//! #     async fn attempt(
//! #         &self,
//! #         identity: &str,
//! #         _credentials: &String,
//! #         _context: &RequestContext,
//! #     ) -> Result<AuthOutcome<String>, Error> {
//! #         Ok(AuthOutcome::Success(identity.to_string()))
//! #     }
//! # }
//! #[tokio::main]
//! async fn main() {
//!     let lockgate = Lockgate::in_memory(LockoutConfig::default()).unwrap();
//!     let guard = lockgate.guard(Arc::new(MyAuthenticator));
//!
//!     let context = RequestContext::from_parts(None, Some("127.0.0.1"), None);
//!     let outcome = guard
//!         .guarded_attempt("alice", &"hunter2".to_string(), &context)
//!         .await
//!         .unwrap();
//!     println!("blocked: {}", outcome.is_blocked());
//! }
//! ```

use std::sync::Arc;

/// Re-export core types from lockgate_core
///
/// These types are commonly used when working with the Lockgate API.
pub use lockgate_core::{
    AttemptFilter, AttemptLog, AuthOutcome, AuthenticationGuard, Authenticator, ConfigError,
    Error, FailedAttempt, GuardOutcome, LockResult, LockStore, LockoutConfig, LockoutEngine,
    LockoutPolicy, LockoutStatus, RequestContext, StoreError,
    guard::LOCKED_MESSAGE,
    memory::{MemoryAttemptLog, MemoryLockStore},
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature
/// is enabled.
#[cfg(feature = "sqlite")]
pub use lockgate_storage_sqlite::{self, SqliteAttemptLog, SqliteLockStore};

/// Main entry point: owns the lockout engine over a chosen pair of stores.
///
/// `Lockgate` is cheap to clone and share; all state lives in the injected
/// stores.
pub struct Lockgate<A: AttemptLog, L: LockStore> {
    engine: Arc<LockoutEngine<A, L>>,
}

impl<A: AttemptLog, L: LockStore> Clone for Lockgate<A, L> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl Lockgate<MemoryAttemptLog, MemoryLockStore> {
    /// Build a lockgate over process-local in-memory stores.
    pub fn in_memory(config: LockoutConfig) -> Result<Self, ConfigError> {
        Self::new(
            Arc::new(MemoryAttemptLog::new()),
            Arc::new(MemoryLockStore::new()),
            config,
        )
    }
}

#[cfg(feature = "sqlite")]
impl Lockgate<SqliteAttemptLog, SqliteLockStore> {
    /// Build a lockgate over SQLite-backed stores sharing one pool.
    ///
    /// The caller is responsible for running
    /// [`lockgate_storage_sqlite::migrate`] first.
    pub fn sqlite(pool: sqlx::SqlitePool, config: LockoutConfig) -> Result<Self, ConfigError> {
        Self::new(
            Arc::new(SqliteAttemptLog::new(pool.clone())),
            Arc::new(SqliteLockStore::new(pool)),
            config,
        )
    }
}

impl<A: AttemptLog, L: LockStore> Lockgate<A, L> {
    /// Build a lockgate over caller-provided stores.
    ///
    /// Fails only on invalid configuration; store health is not probed here.
    pub fn new(attempts: Arc<A>, locks: Arc<L>, config: LockoutConfig) -> Result<Self, ConfigError> {
        let policy = LockoutPolicy::new(config)?;
        Ok(Self {
            engine: Arc::new(LockoutEngine::new(attempts, locks, policy)),
        })
    }

    /// The underlying lockout engine.
    pub fn engine(&self) -> Arc<LockoutEngine<A, L>> {
        self.engine.clone()
    }

    /// Wrap `authenticator` with this lockgate's pre-check / record / re-check
    /// protocol.
    pub fn guard<Auth: Authenticator>(
        &self,
        authenticator: Arc<Auth>,
    ) -> AuthenticationGuard<Auth, A, L> {
        AuthenticationGuard::new(authenticator, self.engine.clone())
    }

    /// Whether `identity` is currently locked.
    pub async fn is_locked(&self, identity: &str) -> Result<bool, Error> {
        self.engine.is_locked(identity).await
    }

    /// Impose a lock on `identity` for the configured duration.
    pub async fn lock(&self, identity: &str) -> Result<(), Error> {
        self.engine.lock(identity).await
    }

    /// Clear any lock on `identity`.
    pub async fn unlock(&self, identity: &str) -> Result<(), Error> {
        self.engine.unlock(identity).await
    }

    /// Point-in-time lockout status for `identity`.
    pub async fn status(&self, identity: &str) -> Result<LockoutStatus, Error> {
        self.engine.status(identity).await
    }
}
