//! Account lockout policy
//!
//! Pure functions over [`SecurityState`]. Stores apply them atomically;
//! nothing here touches persistence.

use crate::config::SecurityConfig;
use chrono::{DateTime, Duration, Utc};
use pawcare_shared::models::SecurityState;

/// Failed-login threshold and lock window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: i32,
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_duration: Duration::hours(2),
        }
    }
}

impl From<&SecurityConfig> for LockoutPolicy {
    fn from(config: &SecurityConfig) -> Self {
        Self {
            max_attempts: config.max_failed_logins,
            lock_duration: Duration::seconds(config.lock_duration_secs),
        }
    }
}

/// True while a lock is in force
pub fn is_locked(state: &SecurityState, now: DateTime<Utc>) -> bool {
    state.locked_until.is_some_and(|until| until > now)
}

impl LockoutPolicy {
    /// Security state after one more failed login
    ///
    /// An expired lock restarts the count at 1. Otherwise the counter grows
    /// and reaching the threshold while unlocked starts a new lock.
    pub fn register_failure(&self, state: &SecurityState, now: DateTime<Utc>) -> SecurityState {
        let mut next = state.clone();

        if state.locked_until.is_some_and(|until| until < now) {
            next.failed_login_count = 1;
            next.locked_until = None;
            return next;
        }

        next.failed_login_count = state.failed_login_count.saturating_add(1);
        if next.failed_login_count >= self.max_attempts && !is_locked(state, now) {
            next.locked_until = Some(now + self.lock_duration);
        }
        next
    }
}

/// Security state after a successful login
pub fn register_success(state: &SecurityState, now: DateTime<Utc>) -> SecurityState {
    SecurityState {
        failed_login_count: 0,
        locked_until: None,
        last_login: Some(now),
        ..state.clone()
    }
}

/// True when the password changed after a token issued at `iat` (seconds)
pub fn changed_password_after(state: &SecurityState, iat: i64) -> bool {
    state
        .password_changed_at
        .is_some_and(|changed| iat < changed.timestamp())
}
