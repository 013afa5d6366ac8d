//! Booking API routes

use super::extract::JsonBody;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use pawcare_shared::types::{
    ApiResponse, BookingListResponse, BookingResponse, CreateBookingRequest,
    UpdateBookingStatusRequest,
};

/// Create booking routes
pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/my", get(my_bookings))
        .route("/:id/status", patch(update_status))
        .route("/:id", delete(cancel_booking))
}

/// POST /api/v1/bookings
async fn create_booking(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<BookingResponse>>)> {
    let booking = state.bookings().create(user.id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Booking created successfully",
            BookingResponse { booking },
        )),
    ))
}

/// GET /api/v1/bookings/my
async fn my_bookings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ApiResponse<BookingListResponse>>> {
    let bookings = state.bookings().list_for_user(user.id).await?;
    let count = bookings.len();
    Ok(Json(
        ApiResponse::ok(BookingListResponse { bookings }).with_count(count),
    ))
}

/// PATCH /api/v1/bookings/:id/status
async fn update_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateBookingStatusRequest>,
) -> ApiResult<Json<ApiResponse<BookingResponse>>> {
    let booking = state.bookings().update_status(&id, &user, req.status).await?;
    Ok(Json(ApiResponse::with_message(
        "Booking status updated successfully",
        BookingResponse { booking },
    )))
}

/// DELETE /api/v1/bookings/:id
async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<BookingResponse>>> {
    let booking = state.bookings().cancel(&id, &user).await?;
    Ok(Json(ApiResponse::with_message(
        "Booking cancelled successfully",
        BookingResponse { booking },
    )))
}
