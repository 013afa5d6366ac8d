//! Booking service
//!
//! Bookings move through REQUESTED → ACCEPTED → IN_PROGRESS → COMPLETED,
//! with CANCELLED reachable before work starts. The booking's owner or
//! any staff member may move it along; staff accepting a booking are
//! assigned to it.

use super::auth::CurrentUser;
use super::pets::PetService;
use crate::error::ApiError;
use crate::repositories::{BookingRepository, NewBooking, UserRepository};
use pawcare_shared::models::{Booking, BookingStatus, UserRole};
use pawcare_shared::types::{BookingView, CreateBookingRequest, EmployeeSummary, PetSummary};
use pawcare_shared::validation::{parse_id, ValidateInput};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const MSG_BOOKING_NOT_FOUND: &str = "Booking not found";
pub const MSG_INVALID_BOOKING_ID: &str = "Invalid booking ID format";

/// Roles that may act on bookings they did not make
const STAFF_ROLES: &[UserRole] = &[UserRole::Employee, UserRole::Admin];

fn is_staff(caller: &CurrentUser) -> bool {
    caller.require_role(STAFF_ROLES).is_ok()
}

#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    pets: PetService,
    users: Arc<dyn UserRepository>,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        pets: PetService,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            bookings,
            pets,
            users,
        }
    }

    /// Book a service for one of the caller's pets
    pub async fn create(&self, user: Uuid, req: CreateBookingRequest) -> Result<Booking, ApiError> {
        req.validate_input()?;
        let pet = self.pets.find_with_ownership(&req.pet, user).await?;

        let booking = self
            .bookings
            .insert(NewBooking {
                user,
                pet: pet.id,
                service_type: req.service_type,
                service_details: req
                    .service_details
                    .unwrap_or_else(|| serde_json::json!({})),
                date: req.date,
                time_slot: req.time_slot.map(|s| s.trim().to_string()),
            })
            .await?;

        info!(booking_id = %booking.id, %user, service = %booking.service_type, "Booking created");
        Ok(booking)
    }

    /// The caller's bookings, latest date first, with pet and employee summaries
    pub async fn list_for_user(&self, user: Uuid) -> Result<Vec<BookingView>, ApiError> {
        let bookings = self.bookings.list_by_user(user).await?;

        let mut views = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let pet_summary = self
                .pets
                .find_owned(booking.pet, user)
                .await?
                .as_ref()
                .map(PetSummary::from);
            let employee_summary = match booking.assigned_employee {
                Some(id) => self
                    .users
                    .find_by_id(id)
                    .await?
                    .as_ref()
                    .map(EmployeeSummary::from),
                None => None,
            };
            views.push(BookingView {
                booking,
                pet_summary,
                employee_summary,
            });
        }
        Ok(views)
    }

    /// Move a booking to `next`
    pub async fn update_status(
        &self,
        booking_id: &str,
        caller: &CurrentUser,
        next: BookingStatus,
    ) -> Result<Booking, ApiError> {
        let booking = self.find_for_caller(booking_id, caller).await?;

        if !booking.status.can_transition_to(next) {
            return Err(ApiError::BadRequest(format!(
                "Cannot change booking status from {} to {}",
                booking.status, next
            )));
        }

        let assign = (next == BookingStatus::Accepted && is_staff(caller)).then_some(caller.id);
        let updated = self
            .bookings
            .transition(booking.id, booking.status, next, assign)
            .await?
            .ok_or_else(|| {
                ApiError::Conflict("Booking was modified by another request".to_string())
            })?;

        info!(booking_id = %updated.id, from = %booking.status, to = %next, "Booking status changed");
        Ok(updated)
    }

    pub async fn cancel(&self, booking_id: &str, caller: &CurrentUser) -> Result<Booking, ApiError> {
        self.update_status(booking_id, caller, BookingStatus::Cancelled)
            .await
    }

    async fn find_for_caller(&self, booking_id: &str, caller: &CurrentUser) -> Result<Booking, ApiError> {
        let id = parse_id(booking_id)
            .ok_or_else(|| ApiError::BadRequest(MSG_INVALID_BOOKING_ID.to_string()))?;

        match self.bookings.find_by_id(id).await? {
            Some(booking) if booking.user == caller.id || is_staff(caller) => Ok(booking),
            _ => Err(ApiError::NotFound(MSG_BOOKING_NOT_FOUND.to_string())),
        }
    }
}
