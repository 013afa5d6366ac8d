//! Application error handling
//!
//! Every failure a handler can produce is one `ApiError` variant. The
//! variant decides the HTTP status and a stable machine-readable code;
//! the conversion into the `{success: false, ...}` envelope happens once,
//! in `IntoResponse`.

use crate::repositories::StoreError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pawcare_shared::{FieldError, ValidationFailure};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const MSG_ACCOUNT_LOCKED: &str =
    "Account is temporarily locked due to multiple failed login attempts. Please try again later.";
pub const MSG_ACCOUNT_SUSPENDED: &str = "Your account has been suspended";
pub const MSG_ACCOUNT_DEACTIVATED: &str = "Your account has been deactivated";
pub const MSG_INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
pub const MSG_REFRESH_TOKEN_EXPIRED: &str = "Refresh token has expired";

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation { errors: Vec<FieldError> },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{}", MSG_INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error("{}", MSG_ACCOUNT_LOCKED)]
    AccountLocked,

    #[error("{}", MSG_ACCOUNT_SUSPENDED)]
    AccountSuspended,

    #[error("{}", MSG_ACCOUNT_DEACTIVATED)]
    AccountDeactivated,

    #[error("{}", MSG_INVALID_REFRESH_TOKEN)]
    InvalidRefreshToken,

    #[error("{}", MSG_REFRESH_TOKEN_EXPIRED)]
    RefreshTokenExpired,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidCredentials
            | ApiError::AccountLocked
            | ApiError::InvalidRefreshToken
            | ApiError::RefreshTokenExpired
            | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::AccountSuspended | ApiError::AccountDeactivated | ApiError::Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code clients can switch on
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::AccountLocked => "ACCOUNT_LOCKED",
            ApiError::AccountSuspended => "ACCOUNT_SUSPENDED",
            ApiError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            ApiError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            ApiError::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Message shown to the client
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::TooManyRequests(msg) => msg.clone(),
            ApiError::Internal(_) => "An internal error occurred".to_string(),
            ApiError::Database(_) => "A database error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(err) => error!("Internal error: {:?}", err),
            ApiError::Database(err) => error!("Database error: {:?}", err),
            _ => {}
        }

        let status = self.status();
        let body = ErrorResponse {
            success: false,
            message: self.public_message(),
            code: self.code(),
            errors: match self {
                ApiError::Validation { errors } => Some(errors),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationFailure> for ApiError {
    fn from(failure: ValidationFailure) -> Self {
        ApiError::Validation {
            errors: failure.errors,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Backend(err) => ApiError::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON with missing or mistyped fields
            JsonRejection::JsonDataError(err) => ApiError::Validation {
                errors: vec![FieldError::new("body", err.body_text())],
            },
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::Validation { errors: vec![] }, StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(ApiError::BadRequest("Invalid pet ID format".into()), StatusCode::BAD_REQUEST)]
    #[case(ApiError::Conflict("Email is already registered".into()), StatusCode::CONFLICT)]
    #[case(ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED)]
    #[case(ApiError::AccountLocked, StatusCode::UNAUTHORIZED)]
    #[case(ApiError::AccountSuspended, StatusCode::FORBIDDEN)]
    #[case(ApiError::AccountDeactivated, StatusCode::FORBIDDEN)]
    #[case(ApiError::InvalidRefreshToken, StatusCode::UNAUTHORIZED)]
    #[case(ApiError::RefreshTokenExpired, StatusCode::UNAUTHORIZED)]
    #[case(ApiError::Forbidden("nope".into()), StatusCode::FORBIDDEN)]
    #[case(ApiError::NotFound("Pet not found".into()), StatusCode::NOT_FOUND)]
    #[case(ApiError::TooManyRequests("slow down".into()), StatusCode::TOO_MANY_REQUESTS)]
    #[case(ApiError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_error_status(#[case] error: ApiError, #[case] expected: StatusCode) {
        assert_eq!(error.into_response().status(), expected);
    }

    #[tokio::test]
    async fn test_validation_envelope_lists_fields() {
        let error: ApiError = ValidationFailure::single("email", "Please provide a valid email address").into();
        let response = error.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let error = ApiError::Internal(anyhow::anyhow!("connection string leaked"));
        let response = error.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["message"], "An internal error occurred");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_store_error_conversion() {
        let error: ApiError = StoreError::Conflict("Email is already registered".into()).into();
        assert!(matches!(error, ApiError::Conflict(_)));
        let error: ApiError = StoreError::NotFound("Refresh token not found".into()).into();
        assert!(matches!(error, ApiError::NotFound(_)));
    }
}
