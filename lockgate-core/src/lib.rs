//! Core functionality for the lockgate account lockout library.
//!
//! Lockgate intercepts authentication attempts, tracks failures per identity
//! within a sliding time window, and temporarily locks an identity once the
//! failure count in that window reaches a threshold. Credential verification
//! itself is delegated to an external [`Authenticator`]; lockgate only decides
//! whether an attempt is allowed to reach it.
//!
//! The core is storage-agnostic: [`AttemptLog`] and [`LockStore`] are traits,
//! with in-memory implementations in [`memory`] and database backends in
//! sibling crates. See [`LockoutEngine`] for the decision engine and
//! [`AuthenticationGuard`] for the wrapping protocol.

pub mod attempt;
pub mod context;
pub mod engine;
pub mod error;
pub mod guard;
pub mod memory;
pub mod policy;
pub mod repository;

pub use attempt::{AttemptFilter, FailedAttempt};
pub use context::RequestContext;
pub use engine::{LockResult, LockoutEngine, LockoutStatus};
pub use error::{ConfigError, Error, StoreError};
pub use guard::{AuthOutcome, AuthenticationGuard, Authenticator, GuardOutcome};
pub use policy::{LockoutConfig, LockoutPolicy};
pub use repository::{AttemptLog, LockStore};
