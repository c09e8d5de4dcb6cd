use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;

/// A single failed authentication attempt.
///
/// Records are immutable and append-only: one is created per failed outcome,
/// never mutated, and never deleted by the core (retention is an external
/// concern). The identity is whatever the client claimed, whether or not such
/// an account exists — recording unknown identities too keeps the log from
/// acting as a user-enumeration oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAttempt {
    /// The claimed account identifier.
    pub identity: String,
    /// Best-effort client network address; empty if unknown.
    pub source_address: String,
    /// Best-effort client software descriptor; empty if unknown.
    pub agent: String,
    /// When the failure occurred.
    pub occurred_at: DateTime<Utc>,
}

impl FailedAttempt {
    /// Create an attempt record stamped with the current time.
    pub fn new(identity: &str, context: &RequestContext) -> Self {
        Self {
            identity: identity.to_string(),
            source_address: context.source_address().to_string(),
            agent: context.agent().to_string(),
            occurred_at: Utc::now(),
        }
    }
}

/// Filter for listing attempt records, for operator tooling.
///
/// `identity` matches exactly; `source_address` and `agent` are substring
/// matches; `since`/`until` bound `occurred_at` (closed on both ends). All
/// fields are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct AttemptFilter {
    pub identity: Option<String>,
    pub source_address: Option<String>,
    pub agent: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of records to return; unlimited when `None`.
    pub limit: Option<usize>,
}

impl AttemptFilter {
    pub fn for_identity(identity: &str) -> Self {
        Self {
            identity: Some(identity.to_string()),
            ..Self::default()
        }
    }

    /// Whether `attempt` satisfies every set field of this filter.
    pub fn matches(&self, attempt: &FailedAttempt) -> bool {
        if let Some(identity) = &self.identity
            && attempt.identity != *identity
        {
            return false;
        }
        if let Some(address) = &self.source_address
            && !attempt.source_address.contains(address.as_str())
        {
            return false;
        }
        if let Some(agent) = &self.agent
            && !attempt.agent.contains(agent.as_str())
        {
            return false;
        }
        if let Some(since) = self.since
            && attempt.occurred_at < since
        {
            return false;
        }
        if let Some(until) = self.until
            && attempt.occurred_at > until
        {
            return false;
        }
        true
    }
}
