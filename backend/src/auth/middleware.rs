//! Authentication extractor
//!
//! Handlers that take an [`AuthUser`] only run for requests carrying a
//! valid access token for an active account.

use crate::error::ApiError;
use crate::services::CurrentUser;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

pub const MSG_TOKEN_MISSING: &str = "No authentication token provided";

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

/// Bearer token from the Authorization header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized(MSG_TOKEN_MISSING.to_string()))?;

        let user = app_state.auth().authenticate(token).await?;
        Ok(AuthUser(user))
    }
}
