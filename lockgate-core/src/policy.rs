use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Policy knobs for the lockout decision.
///
/// All three values must be positive; [`LockoutPolicy::new`] rejects anything
/// else at construction so that call sites never see a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Number of failures within the window that triggers a lock.
    pub max_attempts: u32,
    /// Trailing span over which failures are counted.
    #[serde(with = "duration_seconds")]
    pub window: Duration,
    /// How long an imposed lock lasts.
    #[serde(with = "duration_seconds")]
    pub lock_duration: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::seconds(60),
            lock_duration: Duration::hours(24),
        }
    }
}

/// Pure decision logic: no I/O, no clock, no side effects.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    config: LockoutConfig,
}

impl LockoutPolicy {
    pub fn new(config: LockoutConfig) -> Result<Self, ConfigError> {
        if config.max_attempts == 0 {
            return Err(ConfigError::NonPositiveMaxAttempts);
        }
        if config.window <= Duration::zero() {
            return Err(ConfigError::NonPositiveWindow);
        }
        if config.lock_duration <= Duration::zero() {
            return Err(ConfigError::NonPositiveLockDuration);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Trailing span over which failures are counted.
    pub fn window(&self) -> Duration {
        self.config.window
    }

    /// True when `recent_failures` warrants imposing a lock.
    pub fn should_lock(&self, recent_failures: u64) -> bool {
        recent_failures >= u64::from(self.config.max_attempts)
    }

    /// Lock duration for `identity`.
    ///
    /// Constant today; the identity parameter leaves room for variable
    /// back-off policies without changing the engine.
    pub fn lock_duration_for(&self, _identity: &str) -> Duration {
        self.config.lock_duration
    }
}

/// Serialize `chrono::Duration` as whole seconds, the way the knobs are
/// written in deployment configuration.
mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::seconds(i64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(LockoutPolicy::new(LockoutConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_zero_max_attempts() {
        let config = LockoutConfig {
            max_attempts: 0,
            ..LockoutConfig::default()
        };
        assert_eq!(
            LockoutPolicy::new(config).unwrap_err(),
            ConfigError::NonPositiveMaxAttempts
        );
    }

    #[test]
    fn test_rejects_non_positive_window() {
        let config = LockoutConfig {
            window: Duration::zero(),
            ..LockoutConfig::default()
        };
        assert_eq!(
            LockoutPolicy::new(config).unwrap_err(),
            ConfigError::NonPositiveWindow
        );
    }

    #[test]
    fn test_rejects_non_positive_lock_duration() {
        let config = LockoutConfig {
            lock_duration: Duration::seconds(-1),
            ..LockoutConfig::default()
        };
        assert_eq!(
            LockoutPolicy::new(config).unwrap_err(),
            ConfigError::NonPositiveLockDuration
        );
    }

    #[test]
    fn test_should_lock_at_threshold() {
        let policy = LockoutPolicy::new(LockoutConfig {
            max_attempts: 3,
            ..LockoutConfig::default()
        })
        .unwrap();

        assert!(!policy.should_lock(0));
        assert!(!policy.should_lock(2));
        assert!(policy.should_lock(3));
        assert!(policy.should_lock(4));
    }

    #[test]
    fn test_lock_duration_is_constant() {
        let policy = LockoutPolicy::new(LockoutConfig::default()).unwrap();
        assert_eq!(
            policy.lock_duration_for("alice"),
            policy.lock_duration_for("bob")
        );
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = LockoutConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: LockoutConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_attempts, config.max_attempts);
        assert_eq!(parsed.window, config.window);
        assert_eq!(parsed.lock_duration, config.lock_duration);
    }
}
