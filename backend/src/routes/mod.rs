//! Route definitions for the PawCare API
//!
//! This module organizes all API routes and applies middleware.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::OriginalUri,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod auth;
mod bookings;
pub mod cookie;
mod extract;
mod health;
mod pets;
mod rate_limit;

#[cfg(test)]
mod auth_tests;

pub use auth::auth_routes;
pub use bookings::booking_routes;
pub use extract::JsonBody;
pub use pets::pet_routes;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config()
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/v1", api_routes(&state))
        .fallback(not_found)
        // Apply middleware layers
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_routes(state: &AppState) -> Router<AppState> {
    let limits = state.rate_limits();
    let router = Router::new()
        .route("/", get(api_index))
        .nest("/auth", auth::auth_routes(limits))
        .nest("/pets", pets::pet_routes())
        .nest("/bookings", bookings::booking_routes());

    match limits {
        Some(limits) => router.layer(middleware::from_fn_with_state(
            limits.api.clone(),
            rate_limit::enforce,
        )),
        None => router,
    }
}

async fn api_index() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "PawCare API v1",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/v1/auth",
            "pets": "/api/v1/pets",
            "bookings": "/api/v1/bookings",
        }
    }))
}

async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Route {} not found", uri))
}
