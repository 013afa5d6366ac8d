//! Authentication routes
//!
//! Register, login, refresh, logout and password change. The refresh
//! token is set as an HttpOnly cookie and never appears in a response
//! body; clients hold only the access token.

use super::extract::JsonBody;
use super::rate_limit::limited;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::rate_limit::RateLimits;
use crate::services::RequestMeta;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use pawcare_shared::models::PublicUser;
use pawcare_shared::types::{
    AccessTokenResponse, ApiResponse, AuthResponse, ChangePasswordRequest, LoginRequest,
    RefreshRequest, RegisterRequest,
};

pub const MSG_REFRESH_TOKEN_MISSING: &str = "Refresh token not provided";

/// Envelope plus a Set-Cookie header
type WithCookie<T> = (StatusCode, [(HeaderName, String); 1], Json<ApiResponse<T>>);

/// Create auth routes
///
/// Register and login share one failure-only limiter; refresh has its own.
pub fn auth_routes(limits: Option<&RateLimits>) -> Router<AppState> {
    let auth_limit = limits.map(|l| &l.auth);
    let refresh_limit = limits.map(|l| &l.refresh);

    Router::new()
        .route("/register", limited(post(register), auth_limit))
        .route("/login", limited(post(login), auth_limit))
        .route("/refresh", limited(post(refresh), refresh_limit))
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
        .route("/me", get(me))
        .route("/change-password", put(change_password))
}

/// Refresh token from the cookie, else from the JSON body
fn presented_refresh_token(
    state: &AppState,
    headers: &HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Option<String> {
    state.cookie().read(headers).or_else(|| {
        body.and_then(|Json(req)| req.refresh_token)
            .filter(|token| !token.is_empty())
    })
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    meta: RequestMeta,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<WithCookie<AuthResponse>> {
    let outcome = state.auth().register(req, &meta).await?;
    let cookie = state.cookie().build_set_cookie(&outcome.tokens.refresh_token);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::with_message(
            "User registered successfully",
            AuthResponse {
                user: outcome.user,
                access_token: outcome.tokens.access_token,
            },
        )),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<WithCookie<AuthResponse>> {
    let outcome = state.auth().login(req, &meta).await?;
    let cookie = state.cookie().build_set_cookie(&outcome.tokens.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::with_message(
            "Login successful",
            AuthResponse {
                user: outcome.user,
                access_token: outcome.tokens.access_token,
            },
        )),
    ))
}

/// POST /api/v1/auth/refresh
///
/// Rotates the refresh token: the presented one is revoked and a new
/// cookie replaces it.
async fn refresh(
    State(state): State<AppState>,
    meta: RequestMeta,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<WithCookie<AccessTokenResponse>> {
    let token = presented_refresh_token(&state, &headers, body)
        .ok_or_else(|| ApiError::Unauthorized(MSG_REFRESH_TOKEN_MISSING.to_string()))?;

    let pair = state.auth().refresh(&token, &meta).await?;
    let cookie = state.cookie().build_set_cookie(&pair.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::with_message(
            "Token refreshed successfully",
            AccessTokenResponse {
                access_token: pair.access_token,
            },
        )),
    ))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<WithCookie<()>> {
    let token = presented_refresh_token(&state, &headers, body);
    state.auth().logout(user.id, token.as_deref()).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookie().build_clear_cookie())],
        Json(ApiResponse::message("Logout successful")),
    ))
}

/// POST /api/v1/auth/logout-all
async fn logout_all(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<WithCookie<()>> {
    state.auth().logout_all(user.id).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookie().build_clear_cookie())],
        Json(ApiResponse::message("Logged out from all devices")),
    ))
}

/// GET /api/v1/auth/me
async fn me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    let profile = state.auth().current_user(user.id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PUT /api/v1/auth/change-password
///
/// Every session ends, this one included.
async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> ApiResult<WithCookie<()>> {
    state.auth().change_password(user.id, req).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookie().build_clear_cookie())],
        Json(ApiResponse::message(
            "Password changed successfully. Please login again.",
        )),
    ))
}
