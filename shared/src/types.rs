//! API request and response types

use crate::models::{
    Booking, BookingStatus, Gender, Pet, PublicUser, ServiceType, User, UserRole,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Uniform response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            count: None,
            data: Some(data),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl ApiResponse<()> {
    /// Success envelope that carries only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            count: None,
            data: None,
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Profile fields supplied at registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    #[validate(length(min = 2, max = 50, message = "First name must be between 2 and 50 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters"))]
    pub last_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[validate(nested)]
    pub profile: ProfileInput,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh request; the token may instead arrive in the refresh cookie
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Password change request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Register/login response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: PublicUser,
    pub access_token: String,
}

/// Refresh response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

// ============================================================================
// Pets
// ============================================================================

/// Pet creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetRequest {
    #[validate(length(min = 1, max = 50, message = "Pet name must be between 1 and 50 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 50, message = "Breed cannot exceed 50 characters"))]
    pub breed: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 50.0, message = "Age must be between 0 and 50 years"))]
    pub age: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 500.0, message = "Weight must be between 0 and 500 kg"))]
    pub weight: Option<f64>,
    /// Only present to reject clients that try to pick the owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<serde_json::Value>,
}

/// Pet update request (all fields optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePetRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Pet name must be between 1 and 50 characters"))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50, message = "Breed cannot exceed 50 characters"))]
    pub breed: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 50.0, message = "Age must be between 0 and 50 years"))]
    pub age: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 500.0, message = "Weight must be between 0 and 500 kg"))]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<serde_json::Value>,
}

/// Single pet payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetResponse {
    pub pet: Pet,
}

/// Pet list payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetListResponse {
    pub pets: Vec<Pet>,
}

// ============================================================================
// Bookings
// ============================================================================

/// Booking creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub pet: String,
    pub service_type: ServiceType,
    #[serde(default)]
    pub service_details: Option<serde_json::Value>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    #[validate(length(max = 50, message = "Time slot cannot exceed 50 characters"))]
    pub time_slot: Option<String>,
}

/// Booking status change request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

/// Short pet description embedded in booking listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
}

impl From<&Pet> for PetSummary {
    fn from(pet: &Pet) -> Self {
        Self {
            id: pet.id,
            name: pet.name.clone(),
            breed: pet.breed.clone(),
        }
    }
}

/// Name and contact of the employee handling a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

impl From<&User> for EmployeeSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.profile.full_name(),
            email: user.email.clone(),
        }
    }
}

/// Booking with summaries of the booked pet and the assigned employee
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_summary: Option<PetSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_summary: Option<EmployeeSummary>,
}

/// Single booking payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking: Booking,
}

/// Booking list payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingView>,
}
