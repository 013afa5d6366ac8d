//! Persistence layer
//!
//! Each store is an async trait with a Postgres implementation next to it
//! and an in-memory implementation in [`memory`]. Handlers never see
//! either directly: they go through the [`Stores`] bundle held by
//! `AppState`.

pub mod bookings;
pub mod memory;
pub mod pets;
pub mod refresh_tokens;
pub mod users;

use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub use bookings::{BookingRepository, NewBooking, PgBookingRepository};
pub use memory::{MemoryBookingRepository, MemoryPetRepository, MemoryRefreshTokenLedger, MemoryUserRepository};
pub use pets::{NewPet, PetChanges, PetRepository, PgPetRepository};
pub use refresh_tokens::{NewRefreshToken, PgRefreshTokenLedger, RefreshTokenLedger};
pub use users::{NewUser, PgUserRepository, UserRepository};

/// Persistence failure
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage backend error")]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
        StoreError::Backend(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle bundle for every store the application uses
///
/// Built once at startup and closed on shutdown. Cloning only bumps
/// reference counts.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenLedger>,
    pub pets: Arc<dyn PetRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pool: Option<PgPool>,
}

impl Stores {
    /// Stores backed by a Postgres pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            refresh_tokens: Arc::new(PgRefreshTokenLedger::new(pool.clone())),
            pets: Arc::new(PgPetRepository::new(pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Process-local stores, used by the test suites
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::default()),
            refresh_tokens: Arc::new(MemoryRefreshTokenLedger::default()),
            pets: Arc::new(MemoryPetRepository::default()),
            bookings: Arc::new(MemoryBookingRepository::default()),
            pool: None,
        }
    }

    /// Underlying pool, if any
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Release backend connections
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("Database pool closed");
        }
    }
}
