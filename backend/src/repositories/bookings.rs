//! Booking repository

use super::StoreResult;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pawcare_shared::models::{Booking, BookingStatus, ServiceType};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Input for creating a booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user: Uuid,
    pub pet: Uuid,
    pub service_type: ServiceType,
    pub service_details: serde_json::Value,
    pub date: DateTime<Utc>,
    pub time_slot: Option<String>,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a booking in the `REQUESTED` state
    async fn insert(&self, booking: NewBooking) -> StoreResult<Booking>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Bookings made by one user, latest date first
    async fn list_by_user(&self, user: Uuid) -> StoreResult<Vec<Booking>>;

    /// Move a booking from `from` to `to`, optionally assigning an employee
    ///
    /// `None` when the booking is missing or no longer in `from`. Without
    /// `assign` the current assignment is kept.
    async fn transition(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        assign: Option<Uuid>,
    ) -> StoreResult<Option<Booking>>;
}

/// Booking row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pet_id: Uuid,
    pub service_type: String,
    pub service_details: Json<serde_json::Value>,
    pub booking_date: DateTime<Utc>,
    pub time_slot: Option<String>,
    pub status: String,
    pub assigned_employee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRecord> for Booking {
    type Error = super::StoreError;

    fn try_from(row: BookingRecord) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user: row.user_id,
            pet: row.pet_id,
            service_type: row.service_type.parse().map_err(|e: String| anyhow!(e))?,
            service_details: row.service_details.0,
            date: row.booking_date,
            time_slot: row.time_slot,
            status: row.status.parse().map_err(|e: String| anyhow!(e))?,
            assigned_employee: row.assigned_employee_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = r#"
    id, user_id, pet_id, service_type, service_details, booking_date, time_slot,
    status, assigned_employee_id, created_at, updated_at
"#;

/// Postgres-backed booking repository
#[derive(Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert(&self, booking: NewBooking) -> StoreResult<Booking> {
        let row = sqlx::query_as::<_, BookingRecord>(&format!(
            r#"
            INSERT INTO bookings (user_id, pet_id, service_type, service_details,
                                  booking_date, time_slot, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking.user)
        .bind(booking.pet)
        .bind(booking.service_type.as_str())
        .bind(Json(&booking.service_details))
        .bind(booking.date)
        .bind(&booking.time_slot)
        .bind(BookingStatus::Requested.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_by_user(&self, user: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn transition(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        assign: Option<Uuid>,
    ) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRecord>(&format!(
            r#"
            UPDATE bookings SET
                status = $3,
                assigned_employee_id = COALESCE($4, assigned_employee_id),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(assign)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }
}
