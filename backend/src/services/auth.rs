//! Authentication service
//!
//! Session lifecycle on top of the credential store, the token issuer and
//! the refresh token ledger: register, login, refresh rotation, logout,
//! password change, and access-token authentication.
//!
//! Password work runs on the blocking pool (see `PasswordService`); token
//! signing uses the keys precomputed in `TokenIssuer`.

use super::credentials::CredentialStore;
use crate::auth::lockout::{changed_password_after, is_locked};
use crate::auth::{SecretKind, TokenIssuer, TokenPair};
use crate::error::ApiError;
use crate::repositories::{NewRefreshToken, RefreshTokenLedger, StoreError};
use chrono::Utc;
use pawcare_shared::models::{AccountStatus, PublicUser, User, UserProfile, UserRole};
use pawcare_shared::types::{ChangePasswordRequest, LoginRequest, RegisterRequest};
use pawcare_shared::validation::ValidateInput;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const MSG_TOKEN_INVALID: &str = "Invalid or expired token";
pub const MSG_USER_NOT_FOUND: &str = "User not found";
pub const MSG_NOT_AUTHORIZED: &str = "Not authorized to access this resource";
pub const MSG_PASSWORD_CHANGED: &str = "Password was recently changed. Please login again.";
pub const MSG_WRONG_CURRENT_PASSWORD: &str = "Current password is incorrect";

/// Where a request came from, recorded with each refresh token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of a successful register or login
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub status: AccountStatus,
}

impl CurrentUser {
    /// `Forbidden` unless the caller holds one of `roles`
    pub fn require_role(&self, roles: &[UserRole]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You do not have permission to access this resource".to_string(),
            ))
        }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            status: user.status,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    ledger: Arc<dyn RefreshTokenLedger>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(credentials: CredentialStore, ledger: Arc<dyn RefreshTokenLedger>, tokens: TokenIssuer) -> Self {
        Self {
            credentials,
            ledger,
            tokens,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a new account and open its first session
    pub async fn register(&self, req: RegisterRequest, meta: &RequestMeta) -> Result<AuthOutcome, ApiError> {
        let req = req.normalized();
        req.validate_input()?;

        let profile = UserProfile {
            first_name: req.profile.first_name,
            last_name: req.profile.last_name,
            phone_number: req.profile.phone_number,
            date_of_birth: req.profile.date_of_birth,
            gender: req.profile.gender,
        };

        let user = self
            .credentials
            .create(&req.email, &req.password, req.role.unwrap_or_default(), profile)
            .await?;

        let tokens = self.start_session(user.id, meta).await?;
        Ok(AuthOutcome {
            user: user.to_public(),
            tokens,
        })
    }

    /// Log in with email and password
    ///
    /// Lock and status checks come before the password check, so a locked
    /// account is refused even with the right password.
    pub async fn login(&self, req: LoginRequest, meta: &RequestMeta) -> Result<AuthOutcome, ApiError> {
        let req = req.normalized();
        req.validate_input()?;

        let user = self
            .credentials
            .find_by_email(&req.email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        let now = Utc::now();
        if is_locked(&user.security, now) {
            warn!(user_id = %user.id, "Login attempt on locked account");
            return Err(ApiError::AccountLocked);
        }
        match user.status {
            AccountStatus::Active => {}
            AccountStatus::Suspended => return Err(ApiError::AccountSuspended),
            AccountStatus::Deactivated => return Err(ApiError::AccountDeactivated),
        }

        if !self.credentials.verify_password(&user, &req.password).await? {
            self.credentials.record_failed_login(&user, now).await?;
            return Err(ApiError::InvalidCredentials);
        }

        self.credentials.record_successful_login(&user, now).await?;
        let tokens = self.start_session(user.id, meta).await?;
        info!(user_id = %user.id, "User logged in");

        let mut public = user.to_public();
        public.last_login = Some(now);
        Ok(AuthOutcome {
            user: public,
            tokens,
        })
    }

    /// Exchange a refresh token for a new pair, revoking the old one
    ///
    /// The successor is recorded before the old token is revoked, so a
    /// failed write leaves the presented token usable.
    pub async fn refresh(&self, refresh_token: &str, meta: &RequestMeta) -> Result<TokenPair, ApiError> {
        let claims = self
            .tokens
            .verify(refresh_token, SecretKind::Refresh)
            .ok_or(ApiError::InvalidRefreshToken)?;
        let user_id = claims.user_id().ok_or(ApiError::InvalidRefreshToken)?;

        let now = Utc::now();
        let record = self
            .ledger
            .find_active(refresh_token, now)
            .await?
            .ok_or(ApiError::RefreshTokenExpired)?;
        if record.user_id != user_id {
            warn!(%user_id, owner = %record.user_id, "Refresh token subject does not match ledger owner");
            return Err(ApiError::RefreshTokenExpired);
        }

        let user = self
            .credentials
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(MSG_USER_NOT_FOUND.to_string()))?;
        if user.status != AccountStatus::Active {
            return Err(ApiError::Forbidden(MSG_NOT_AUTHORIZED.to_string()));
        }

        let pair = self.tokens.issue_pair(user.id)?;
        self.ledger
            .store(NewRefreshToken {
                token: pair.refresh_token.clone(),
                user_id: user.id,
                expires_at: pair.refresh_expires_at,
                created_by_ip: meta.ip.clone(),
                user_agent: meta.user_agent.clone(),
            })
            .await?;

        // Only one concurrent rotation of the same token may win
        match self
            .ledger
            .revoke(refresh_token, Some(&pair.refresh_token), now)
            .await
        {
            Ok(true) => {}
            Ok(false) | Err(StoreError::NotFound(_)) => {
                warn!(user_id = %user.id, "Refresh token was rotated concurrently");
                self.discard_unused(&pair.refresh_token).await;
                return Err(ApiError::RefreshTokenExpired);
            }
            Err(e) => {
                self.discard_unused(&pair.refresh_token).await;
                return Err(e.into());
            }
        }

        debug!(user_id = %user.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Drop a successor token that was recorded but never handed out
    async fn discard_unused(&self, token: &str) {
        if let Err(e) = self.ledger.discard(token).await {
            warn!(error = %e, "Failed to discard unused refresh token");
        }
    }

    /// Revoke one of the caller's refresh tokens
    ///
    /// Absent, unknown or inactive tokens are ignored, and so are tokens
    /// belonging to another user.
    pub async fn logout(&self, user_id: Uuid, refresh_token: Option<&str>) -> Result<(), ApiError> {
        let Some(token) = refresh_token else {
            debug!(%user_id, "Logout without refresh token");
            return Ok(());
        };

        let now = Utc::now();
        match self.ledger.find_active(token, now).await? {
            None => {
                debug!(%user_id, "Logout with unknown or inactive refresh token");
                return Ok(());
            }
            Some(record) if record.user_id != user_id => {
                warn!(%user_id, owner = %record.user_id, "Logout with another user's refresh token ignored");
                return Ok(());
            }
            Some(_) => {}
        }

        match self.ledger.revoke(token, None, now).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound(_)) => {
                debug!("Logout with unknown refresh token");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke every refresh token of a user
    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64, ApiError> {
        let revoked = self.ledger.revoke_all_for_user(user_id, Utc::now()).await?;
        info!(%user_id, revoked, "Logged out of all sessions");
        Ok(revoked)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<PublicUser, ApiError> {
        let user = self
            .credentials
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(MSG_USER_NOT_FOUND.to_string()))?;
        Ok(user.to_public())
    }

    /// Change the password and end every session of the user
    pub async fn change_password(&self, user_id: Uuid, req: ChangePasswordRequest) -> Result<(), ApiError> {
        req.validate_input()?;

        let user = self
            .credentials
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(MSG_USER_NOT_FOUND.to_string()))?;

        if !self
            .credentials
            .verify_password(&user, &req.current_password)
            .await?
        {
            return Err(ApiError::Unauthorized(MSG_WRONG_CURRENT_PASSWORD.to_string()));
        }

        let now = Utc::now();
        self.credentials
            .change_password(&user, &req.new_password, now)
            .await?;
        let revoked = self.ledger.revoke_all_for_user(user.id, now).await?;
        info!(user_id = %user.id, revoked, "Password changed");
        Ok(())
    }

    /// Resolve an access token to the caller behind it
    pub async fn authenticate(&self, access_token: &str) -> Result<CurrentUser, ApiError> {
        let claims = self
            .tokens
            .verify(access_token, SecretKind::Access)
            .ok_or_else(|| ApiError::Unauthorized(MSG_TOKEN_INVALID.to_string()))?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| ApiError::Unauthorized(MSG_TOKEN_INVALID.to_string()))?;

        let user = self
            .credentials
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(MSG_USER_NOT_FOUND.to_string()))?;

        if user.status != AccountStatus::Active {
            return Err(ApiError::Forbidden(MSG_NOT_AUTHORIZED.to_string()));
        }
        if changed_password_after(&user.security, claims.iat) {
            return Err(ApiError::Unauthorized(MSG_PASSWORD_CHANGED.to_string()));
        }

        Ok(CurrentUser::from(&user))
    }

    async fn start_session(&self, user_id: Uuid, meta: &RequestMeta) -> Result<TokenPair, ApiError> {
        let pair = self.tokens.issue_pair(user_id)?;
        self.ledger
            .store(NewRefreshToken {
                token: pair.refresh_token.clone(),
                user_id,
                expires_at: pair.refresh_expires_at,
                created_by_ip: meta.ip.clone(),
                user_agent: meta.user_agent.clone(),
            })
            .await?;
        Ok(pair)
    }
}
