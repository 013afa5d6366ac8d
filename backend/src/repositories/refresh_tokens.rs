//! Refresh token ledger
//!
//! Every refresh token handed to a client is recorded here. A token is
//! usable only while its record is neither revoked nor expired; rotation
//! revokes the old record and links it to its successor.

use super::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pawcare_shared::models::RefreshTokenRecord;
use sqlx::PgPool;
use uuid::Uuid;

/// A refresh token about to be recorded
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_by_ip: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
pub trait RefreshTokenLedger: Send + Sync {
    /// Record a newly issued token; `Conflict` if the token string exists
    async fn store(&self, token: NewRefreshToken) -> StoreResult<RefreshTokenRecord>;

    /// The record for `token`, only if it is still active at `now`
    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshTokenRecord>>;

    /// Mark a token revoked, optionally linking the token that replaced it
    ///
    /// Returns `true` when this call performed the revocation and `false`
    /// when the token was already revoked. Unknown tokens are `NotFound`.
    async fn revoke(
        &self,
        token: &str,
        replaced_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Delete one record outright, whatever its state
    async fn discard(&self, token: &str) -> StoreResult<bool>;

    /// Revoke every unrevoked token of a user, returning how many changed
    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Delete records that expired before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

/// Refresh token row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRow {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub replaced_by_token: Option<String>,
    pub created_by_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<RefreshTokenRow> for RefreshTokenRecord {
    fn from(row: RefreshTokenRow) -> Self {
        Self {
            token: row.token,
            user_id: row.user_id,
            expires_at: row.expires_at,
            is_revoked: row.is_revoked,
            revoked_at: row.revoked_at,
            replaced_by_token: row.replaced_by_token,
            created_by_ip: row.created_by_ip,
            user_agent: row.user_agent,
            created_at: row.created_at,
        }
    }
}

/// Postgres-backed ledger
#[derive(Clone)]
pub struct PgRefreshTokenLedger {
    pool: PgPool,
}

impl PgRefreshTokenLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenLedger for PgRefreshTokenLedger {
    async fn store(&self, token: NewRefreshToken) -> StoreResult<RefreshTokenRecord> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at, created_by_ip, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING token, user_id, expires_at, is_revoked, revoked_at,
                      replaced_by_token, created_by_ip, user_agent, created_at
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.expires_at)
        .bind(&token.created_by_ip)
        .bind(&token.user_agent)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshTokenRecord>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT token, user_id, expires_at, is_revoked, revoked_at,
                   replaced_by_token, created_by_ip, user_agent, created_at
            FROM refresh_tokens
            WHERE token = $1 AND NOT is_revoked AND expires_at > $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn revoke(
        &self,
        token: &str,
        replaced_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        // The row lock makes a concurrent second revocation observe is_revoked = true
        let was_revoked: Option<bool> = sqlx::query_scalar(
            r#"
            WITH previous AS (
                SELECT token, is_revoked FROM refresh_tokens WHERE token = $1 FOR UPDATE
            )
            UPDATE refresh_tokens r SET
                is_revoked = TRUE,
                revoked_at = CASE WHEN previous.is_revoked THEN r.revoked_at ELSE $3 END,
                replaced_by_token = CASE
                    WHEN previous.is_revoked THEN r.replaced_by_token
                    ELSE COALESCE($2, r.replaced_by_token)
                END
            FROM previous
            WHERE r.token = previous.token
            RETURNING previous.is_revoked
            "#,
        )
        .bind(token)
        .bind(replaced_by)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match was_revoked {
            Some(already) => Ok(!already),
            None => Err(StoreError::NotFound("Refresh token not found".to_string())),
        }
    }

    async fn discard(&self, token: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = $2
            WHERE user_id = $1 AND NOT is_revoked
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
