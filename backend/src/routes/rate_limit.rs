//! Rate limiting middleware
//!
//! Requests are keyed by client IP: proxy headers first, then the peer
//! address. Refused requests get the 429 error envelope. Every response
//! carries `RateLimit-*` headers from the innermost limiter.

use super::extract::client_ip;
use crate::error::ApiError;
use crate::rate_limit::{RateLimitResult, RateLimiter};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use tracing::warn;

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Wrap one route in `limiter`, or leave it as is when limiting is off
pub fn limited<S>(route: MethodRouter<S>, limiter: Option<&RateLimiter>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    match limiter {
        Some(limiter) => route.layer(middleware::from_fn_with_state(limiter.clone(), enforce)),
        None => route,
    }
}

fn client_key(request: &Request) -> String {
    client_ip(request.headers())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_headers(headers: &mut HeaderMap, result: &RateLimitResult, now: DateTime<Utc>) {
    let values = [
        (&RATELIMIT_LIMIT, result.limit.to_string()),
        (&RATELIMIT_REMAINING, result.remaining.to_string()),
        (&RATELIMIT_RESET, result.reset_after_secs(now).to_string()),
    ];
    for (name, value) in values {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.entry(name.clone()).or_insert(value);
        }
    }
}

/// Count the request against `limiter` and refuse it once the window is full
pub async fn enforce(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let client = client_key(&request);
    let now = Utc::now();

    let result = match limiter.check(&client, now).await {
        Ok(result) => result,
        Err(e) => {
            warn!(scope = limiter.scope(), error = %e, "Rate limit store unavailable; request let through");
            return next.run(request).await;
        }
    };

    if !result.allowed {
        warn!(scope = limiter.scope(), %client, "Rate limit exceeded");
        let mut response = ApiError::TooManyRequests(limiter.message().to_string()).into_response();
        set_headers(response.headers_mut(), &result, now);
        if let Ok(retry) = HeaderValue::from_str(&result.reset_after_secs(now).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, retry);
        }
        return response;
    }

    let mut response = next.run(request).await;

    let mut remaining = result.remaining;
    if !limiter.counts_successful() && response.status().is_success() {
        match limiter.refund(&client, now).await {
            Ok(()) => remaining = remaining.saturating_add(1).min(result.limit),
            Err(e) => warn!(scope = limiter.scope(), error = %e, "Failed to refund rate limit slot"),
        }
    }

    set_headers(
        response.headers_mut(),
        &RateLimitResult { remaining, ..result },
        now,
    );
    response
}
