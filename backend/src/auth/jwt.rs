//! JWT token issuing and verification
//!
//! Access and refresh tokens are signed with separate secrets, so a token
//! of one kind can never verify as the other even if the `token_type`
//! claim were forged. Keys are derived once at startup.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type: "access" or "refresh"
    pub token_type: String,
    /// Random token ID; keeps tokens minted in the same second distinct
    pub jti: String,
}

impl Claims {
    /// Subject as a user ID
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Which secret a token is signed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Access,
    Refresh,
}

impl SecretKind {
    fn token_type(self) -> &'static str {
        match self {
            SecretKind::Access => "access",
            SecretKind::Refresh => "refresh",
        }
    }
}

/// Pre-computed signing and verification keys for one secret
#[derive(Clone)]
struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// Freshly issued access + refresh token
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues and verifies signed tokens
///
/// Cheap to clone: the keys sit behind `Arc`s.
#[derive(Clone)]
pub struct TokenIssuer {
    access: JwtKeys,
    refresh: JwtKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access: JwtKeys::new(access_secret),
            refresh: JwtKeys::new(refresh_secret),
            access_ttl: Duration::seconds(access_token_expiry_secs),
            refresh_ttl: Duration::seconds(refresh_token_expiry_secs),
            validation,
        }
    }

    fn keys(&self, kind: SecretKind) -> &JwtKeys {
        match kind {
            SecretKind::Access => &self.access,
            SecretKind::Refresh => &self.refresh,
        }
    }

    fn ttl(&self, kind: SecretKind) -> Duration {
        match kind {
            SecretKind::Access => self.access_ttl,
            SecretKind::Refresh => self.refresh_ttl,
        }
    }

    /// Sign a token of the given kind issued at `now`
    pub fn issue_at(&self, user_id: Uuid, kind: SecretKind, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.ttl(kind)).timestamp(),
            iat: now.timestamp(),
            token_type: kind.token_type().to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)
            .map_err(|e| anyhow::anyhow!("Failed to generate {} token: {}", kind.token_type(), e))
    }

    #[inline]
    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String> {
        self.issue_at(user_id, SecretKind::Access, Utc::now())
    }

    #[inline]
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String> {
        self.issue_at(user_id, SecretKind::Refresh, Utc::now())
    }

    /// Issue both tokens for a session
    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.issue_at(user_id, SecretKind::Access, now)?,
            refresh_token: self.issue_at(user_id, SecretKind::Refresh, now)?,
            refresh_expires_at: now + self.refresh_ttl,
        })
    }

    /// Verify a token against the secret of `kind`
    ///
    /// Bad signature, malformed payload, expiry and a mismatched
    /// `token_type` all yield `None`.
    pub fn verify(&self, token: &str, kind: SecretKind) -> Option<Claims> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation).ok()?;
        (data.claims.token_type == kind.token_type()).then_some(data.claims)
    }

    /// Refresh token lifetime
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}
