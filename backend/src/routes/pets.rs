//! Pet API routes
//!
//! Every route requires a Bearer token; callers only ever see their own pets.

use super::extract::JsonBody;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use pawcare_shared::types::{
    ApiResponse, CreatePetRequest, PetListResponse, PetResponse, UpdatePetRequest,
};
use serde_json::{json, Value};

/// Create pet routes
pub fn pet_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_pet).get(list_pets))
        .route("/:id", put(update_pet).delete(delete_pet))
}

/// POST /api/v1/pets
async fn create_pet(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<CreatePetRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PetResponse>>)> {
    let pet = state.pets().create(user.id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Pet created successfully", PetResponse { pet })),
    ))
}

/// GET /api/v1/pets - newest first
async fn list_pets(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ApiResponse<PetListResponse>>> {
    let pets = state.pets().list_for_owner(user.id).await?;
    let count = pets.len();
    Ok(Json(ApiResponse::ok(PetListResponse { pets }).with_count(count)))
}

/// PUT /api/v1/pets/:id
async fn update_pet(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdatePetRequest>,
) -> ApiResult<Json<ApiResponse<PetResponse>>> {
    let pet = state.pets().update(&id, user.id, req).await?;
    Ok(Json(ApiResponse::with_message(
        "Pet updated successfully",
        PetResponse { pet },
    )))
}

/// DELETE /api/v1/pets/:id
async fn delete_pet(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    state.pets().delete(&id, user.id).await?;
    Ok(Json(ApiResponse::with_message("Pet deleted successfully", json!({}))))
}
