//! User repository

use super::{StoreError, StoreResult};
use crate::auth::LockoutPolicy;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pawcare_shared::models::{
    AccountStatus, Gender, SecurityState, User, UserProfile, UserRole,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub profile: UserProfile,
    pub registration_source: String,
}

/// Storage for user accounts
///
/// Emails are stored exactly as given; callers normalize them first.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; `Conflict` when the email is taken
    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Apply one failed login atomically and return the resulting state
    async fn record_failed_login(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        policy: &LockoutPolicy,
    ) -> StoreResult<SecurityState>;

    /// Clear the failure counter and lock, stamp the login time
    async fn record_successful_login(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<()>;

    /// Replace the password hash
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn set_status(&self, id: Uuid, status: AccountStatus) -> StoreResult<()>;
}

/// User row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub failed_login_count: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub registration_source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = StoreError;

    fn try_from(row: UserRecord) -> Result<Self, Self::Error> {
        let role = row.role.parse::<UserRole>().map_err(|e| anyhow!(e))?;
        let status = row.status.parse::<AccountStatus>().map_err(|e| anyhow!(e))?;
        let gender = row
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(|e| anyhow!(e))?;

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role,
            status,
            profile: UserProfile {
                first_name: row.first_name,
                last_name: row.last_name,
                phone_number: row.phone_number,
                date_of_birth: row.date_of_birth,
                gender,
            },
            security: SecurityState {
                failed_login_count: row.failed_login_count,
                locked_until: row.locked_until,
                password_changed_at: row.password_changed_at,
                last_login: row.last_login,
            },
            registration_source: row.registration_source,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = r#"
    id, email, password_hash, role, status,
    first_name, last_name, phone_number, date_of_birth, gender,
    failed_login_count, locked_until, password_changed_at, last_login,
    registration_source, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct SecurityRow {
    failed_login_count: i32,
    locked_until: Option<DateTime<Utc>>,
    password_changed_at: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
}

/// Postgres-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (email, password_hash, role, first_name, last_name,
                               phone_number, date_of_birth, gender, registration_source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.profile.first_name)
        .bind(&user.profile.last_name)
        .bind(&user.profile.phone_number)
        .bind(user.profile.date_of_birth)
        .bind(user.profile.gender.map(|g| g.as_str()))
        .bind(&user.registration_source)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict("Email is already registered".to_string()),
            other => other,
        })?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn record_failed_login(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        policy: &LockoutPolicy,
    ) -> StoreResult<SecurityState> {
        // Same rules as LockoutPolicy::register_failure, in one statement
        let row = sqlx::query_as::<_, SecurityRow>(
            r#"
            UPDATE users SET
                failed_login_count = CASE
                    WHEN locked_until IS NOT NULL AND locked_until < $2 THEN 1
                    ELSE failed_login_count + 1
                END,
                locked_until = CASE
                    WHEN locked_until IS NOT NULL AND locked_until < $2 THEN NULL
                    WHEN failed_login_count + 1 >= $3
                         AND (locked_until IS NULL OR locked_until <= $2) THEN $4
                    ELSE locked_until
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING failed_login_count, locked_until, password_changed_at, last_login
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(policy.max_attempts)
        .bind(now + policy.lock_duration)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("User not found".to_string()))?;

        Ok(SecurityState {
            failed_login_count: row.failed_login_count,
            locked_until: row.locked_until,
            password_changed_at: row.password_changed_at,
            last_login: row.last_login,
        })
    }

    async fn record_successful_login(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET failed_login_count = 0, locked_until = NULL, last_login = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, password_changed_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(changed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: AccountStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}
