//! End-to-end tests of the guarded authentication protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use lockgate::{
    AttemptFilter, AttemptLog, AuthOutcome, Authenticator, Error, GuardOutcome, Lockgate,
    LockoutConfig, RequestContext,
};

/// Authenticator that accepts a single fixed password and counts invocations.
struct PasswordAuthenticator {
    password: String,
    calls: AtomicUsize,
}

impl PasswordAuthenticator {
    fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    type Credentials = String;
    type Principal = String;

    async fn attempt(
        &self,
        identity: &str,
        credentials: &String,
        _context: &RequestContext,
    ) -> Result<AuthOutcome<String>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *credentials == self.password {
            Ok(AuthOutcome::Success(identity.to_string()))
        } else {
            Ok(AuthOutcome::Failure)
        }
    }
}

fn config(max_attempts: u32, window_secs: i64) -> LockoutConfig {
    let _ = tracing_subscriber::fmt().try_init();
    LockoutConfig {
        max_attempts,
        window: Duration::seconds(window_secs),
        lock_duration: Duration::minutes(15),
    }
}

#[tokio::test]
async fn three_failures_within_window_lock_the_account() {
    let lockgate = Lockgate::in_memory(config(3, 30)).unwrap();
    let guard = lockgate.guard(Arc::new(PasswordAuthenticator::new("hunter2")));
    let context = RequestContext::empty();

    for _ in 0..2 {
        let outcome = guard
            .guarded_attempt("alice", &"wrong".to_string(), &context)
            .await
            .unwrap();
        assert_eq!(outcome, GuardOutcome::Failure);
    }

    let outcome = guard
        .guarded_attempt("alice", &"wrong".to_string(), &context)
        .await
        .unwrap();
    assert_eq!(outcome, GuardOutcome::BlockedAfterAttempt);
    assert!(lockgate.is_locked("alice").await.unwrap());
}

#[tokio::test]
async fn two_failures_do_not_lock() {
    let lockgate = Lockgate::in_memory(config(3, 30)).unwrap();
    let guard = lockgate.guard(Arc::new(PasswordAuthenticator::new("hunter2")));

    for _ in 0..2 {
        guard
            .guarded_attempt("alice", &"wrong".to_string(), &RequestContext::empty())
            .await
            .unwrap();
    }
    assert!(!lockgate.is_locked("alice").await.unwrap());
}

#[tokio::test]
async fn locked_identity_never_reaches_the_authenticator() {
    let authenticator = Arc::new(PasswordAuthenticator::new("hunter2"));
    let lockgate = Lockgate::in_memory(config(3, 30)).unwrap();
    let guard = lockgate.guard(authenticator.clone());

    lockgate.lock("alice").await.unwrap();

    let outcome = guard
        .guarded_attempt("alice", &"hunter2".to_string(), &RequestContext::empty())
        .await
        .unwrap();
    assert_eq!(outcome, GuardOutcome::Blocked);
    assert_eq!(authenticator.call_count(), 0);
    assert!(outcome.user_message().is_some());
}

#[tokio::test]
async fn valid_login_appends_no_attempts() {
    let lockgate = Lockgate::in_memory(config(3, 30)).unwrap();
    let guard = lockgate.guard(Arc::new(PasswordAuthenticator::new("hunter2")));

    let outcome = guard
        .guarded_attempt("alice", &"hunter2".to_string(), &RequestContext::empty())
        .await
        .unwrap();
    assert_eq!(outcome, GuardOutcome::Success("alice".to_string()));

    let attempts = lockgate
        .engine()
        .attempt_log()
        .find(&AttemptFilter::for_identity("alice"))
        .await
        .unwrap();
    assert!(attempts.is_empty());
}

#[tokio::test]
async fn unlock_takes_effect_immediately() {
    let lockgate = Lockgate::in_memory(config(3, 30)).unwrap();

    lockgate.lock("carol").await.unwrap();
    lockgate.unlock("carol").await.unwrap();
    assert!(!lockgate.is_locked("carol").await.unwrap());
}

#[tokio::test]
async fn failures_for_one_identity_leave_others_untouched() {
    let lockgate = Lockgate::in_memory(config(2, 60)).unwrap();
    let guard = lockgate.guard(Arc::new(PasswordAuthenticator::new("hunter2")));

    for _ in 0..2 {
        guard
            .guarded_attempt("alice", &"wrong".to_string(), &RequestContext::empty())
            .await
            .unwrap();
    }

    assert!(lockgate.is_locked("alice").await.unwrap());
    assert!(!lockgate.is_locked("bob").await.unwrap());
}

#[tokio::test]
async fn status_carries_precise_data_for_logging() {
    let lockgate = Lockgate::in_memory(config(2, 60)).unwrap();
    let guard = lockgate.guard(Arc::new(PasswordAuthenticator::new("hunter2")));
    let context = RequestContext::from_parts(Some("8.8.8.8, 9.9.9.9"), None, Some("curl/8.0"));

    for _ in 0..2 {
        guard
            .guarded_attempt("alice", &"wrong".to_string(), &context)
            .await
            .unwrap();
    }

    let status = lockgate.status("alice").await.unwrap();
    assert!(status.is_locked);
    assert_eq!(status.recent_failures, 2);
    assert!(status.retry_after_seconds().unwrap() > 0);

    let attempts = lockgate
        .engine()
        .attempt_log()
        .find(&AttemptFilter::for_identity("alice"))
        .await
        .unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].source_address, "8.8.8.8");
    assert_eq!(attempts[0].agent, "curl/8.0");
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use lockgate::lockgate_storage_sqlite::migrate;
    use sqlx::SqlitePool;

    #[tokio::test]
    async fn full_protocol_over_sqlite() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        migrate(&pool).await.unwrap();

        let lockgate = Lockgate::sqlite(pool, config(3, 30)).unwrap();
        let authenticator = Arc::new(PasswordAuthenticator::new("hunter2"));
        let guard = lockgate.guard(authenticator.clone());
        let context = RequestContext::from_parts(None, Some("127.0.0.1"), None);

        for _ in 0..2 {
            let outcome = guard
                .guarded_attempt("alice", &"wrong".to_string(), &context)
                .await
                .unwrap();
            assert_eq!(outcome, GuardOutcome::Failure);
        }

        let outcome = guard
            .guarded_attempt("alice", &"wrong".to_string(), &context)
            .await
            .unwrap();
        assert_eq!(outcome, GuardOutcome::BlockedAfterAttempt);

        // locked: the correct password no longer reaches the authenticator
        let calls_before = authenticator.call_count();
        let outcome = guard
            .guarded_attempt("alice", &"hunter2".to_string(), &context)
            .await
            .unwrap();
        assert_eq!(outcome, GuardOutcome::Blocked);
        assert_eq!(authenticator.call_count(), calls_before);

        // operator unlock restores access
        lockgate.unlock("alice").await.unwrap();
        let outcome = guard
            .guarded_attempt("alice", &"hunter2".to_string(), &context)
            .await
            .unwrap();
        assert_eq!(outcome, GuardOutcome::Success("alice".to_string()));
    }
}
