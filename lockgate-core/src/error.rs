use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Invalid policy configuration, rejected at construction and never at call time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_attempts must be a positive integer")]
    NonPositiveMaxAttempts,

    #[error("window must be a positive duration")]
    NonPositiveWindow,

    #[error("lock_duration must be a positive duration")]
    NonPositiveLockDuration,
}

/// Failure of a backing [`AttemptLog`](crate::AttemptLog) or
/// [`LockStore`](crate::LockStore).
///
/// Store errors are propagated to the caller rather than mapped onto a lock
/// decision: treating an outage as "unlocked" would defeat the guard, and
/// treating it as "locked" would deny legitimate users. The caller owns the
/// fail-open / fail-closed choice. The core never retries store calls.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store call timed out: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl Error {
    /// True when the error came from a backing store rather than configuration.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}
