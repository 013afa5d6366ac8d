//! Business logic services
//!
//! Services sit between HTTP handlers and the stores. They own
//! validation, authorization and every multi-step operation.

pub mod auth;
pub mod bookings;
pub mod credentials;
pub mod pets;
pub mod token_cleanup;

pub use auth::{AuthOutcome, AuthService, CurrentUser, RequestMeta};
pub use bookings::BookingService;
pub use credentials::CredentialStore;
pub use pets::PetService;
