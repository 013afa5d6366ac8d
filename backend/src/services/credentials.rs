//! Credential store
//!
//! Owns everything about stored credentials: email normalization, password
//! hashing, lockout bookkeeping. The hash never leaves this layer in any
//! external representation; callers get [`User`] internally and
//! `PublicUser` for output.

use crate::auth::{LockoutPolicy, PasswordService};
use crate::repositories::{NewUser, StoreError, StoreResult, UserRepository};
use chrono::{DateTime, Duration, Utc};
use pawcare_shared::models::{AccountStatus, SecurityState, User, UserProfile, UserRole};
use pawcare_shared::validation::normalize_email;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const MSG_EMAIL_TAKEN: &str = "Email is already registered";

#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
    passwords: PasswordService,
    lockout: LockoutPolicy,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>, passwords: PasswordService, lockout: LockoutPolicy) -> Self {
        Self {
            users,
            passwords,
            lockout,
        }
    }

    pub fn lockout(&self) -> &LockoutPolicy {
        &self.lockout
    }

    /// Create an account with a freshly hashed password
    pub async fn create(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
        profile: UserProfile,
    ) -> StoreResult<User> {
        let email = normalize_email(email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(StoreError::Conflict(MSG_EMAIL_TAKEN.to_string()));
        }

        let password_hash = self.passwords.hash_async(password.to_string()).await?;

        // The unique index still catches a concurrent registration
        let user = self
            .users
            .insert(NewUser {
                email,
                password_hash,
                role,
                profile,
                registration_source: "web".to_string(),
            })
            .await?;

        info!(user_id = %user.id, "User account created");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.users.find_by_email(&normalize_email(email)).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    /// Check a candidate password against the stored hash
    pub async fn verify_password(&self, user: &User, candidate: &str) -> StoreResult<bool> {
        Ok(PasswordService::verify_async(candidate.to_string(), user.password_hash.clone()).await?)
    }

    pub async fn record_failed_login(&self, user: &User, now: DateTime<Utc>) -> StoreResult<SecurityState> {
        let state = self
            .users
            .record_failed_login(user.id, now, &self.lockout)
            .await?;

        if state.failed_login_count >= self.lockout.max_attempts {
            warn!(
                user_id = %user.id,
                attempts = state.failed_login_count,
                locked_until = ?state.locked_until,
                "Account locked after repeated failed logins"
            );
        }
        Ok(state)
    }

    pub async fn record_successful_login(&self, user: &User, now: DateTime<Utc>) -> StoreResult<()> {
        self.users.record_successful_login(user.id, now).await
    }

    /// Replace the password; tokens issued before `now` stop authenticating
    pub async fn change_password(&self, user: &User, new_password: &str, now: DateTime<Utc>) -> StoreResult<()> {
        let password_hash = self.passwords.hash_async(new_password.to_string()).await?;
        // Backdated so a token issued in the same second still counts as newer
        let changed_at = now - Duration::seconds(1);
        self.users
            .update_password(user.id, &password_hash, changed_at)
            .await
    }

    pub async fn set_status(&self, id: Uuid, status: AccountStatus) -> StoreResult<()> {
        self.users.set_status(id, status).await
    }
}
