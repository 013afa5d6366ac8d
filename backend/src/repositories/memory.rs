//! In-memory stores
//!
//! `HashMap`s behind `tokio::sync::RwLock`. Every mutating operation
//! holds the write lock for its whole read-modify-write, which gives the
//! same atomicity as the single-statement Postgres versions.

use super::{
    BookingRepository, NewBooking, NewPet, NewRefreshToken, NewUser, PetChanges, PetRepository,
    RefreshTokenLedger, StoreError, StoreResult, UserRepository,
};
use crate::auth::lockout::{register_success, LockoutPolicy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pawcare_shared::models::{
    AccountStatus, Booking, BookingStatus, Pet, RefreshTokenRecord, SecurityState, User,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

fn user_not_found() -> StoreError {
    StoreError::NotFound("User not found".to_string())
}

/// In-memory user accounts keyed by id
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email is already registered".to_string()));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            status: AccountStatus::Active,
            profile: user.profile,
            security: SecurityState::default(),
            registration_source: user.registration_source,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn record_failed_login(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        policy: &LockoutPolicy,
    ) -> StoreResult<SecurityState> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(user_not_found)?;
        user.security = policy.register_failure(&user.security, now);
        user.updated_at = now;
        Ok(user.security.clone())
    }

    async fn record_successful_login(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(user_not_found)?;
        user.security = register_success(&user.security, now);
        user.updated_at = now;
        Ok(())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(user_not_found)?;
        user.password_hash = password_hash.to_string();
        user.security.password_changed_at = Some(changed_at);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: AccountStatus) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(user_not_found)?;
        user.status = status;
        user.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory refresh token ledger keyed by token string
#[derive(Clone, Default)]
pub struct MemoryRefreshTokenLedger {
    tokens: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
}

impl MemoryRefreshTokenLedger {
    /// Number of records currently held, revoked ones included
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenLedger for MemoryRefreshTokenLedger {
    async fn store(&self, token: NewRefreshToken) -> StoreResult<RefreshTokenRecord> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.token) {
            return Err(StoreError::Conflict("Refresh token already recorded".to_string()));
        }

        let record = RefreshTokenRecord {
            token: token.token,
            user_id: token.user_id,
            expires_at: token.expires_at,
            is_revoked: false,
            revoked_at: None,
            replaced_by_token: None,
            created_by_ip: token.created_by_ip,
            user_agent: token.user_agent,
            created_at: Utc::now(),
        };
        tokens.insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshTokenRecord>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(token).filter(|r| r.is_active(now)).cloned())
    }

    async fn revoke(
        &self,
        token: &str,
        replaced_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tokens = self.tokens.write().await;
        let record = tokens
            .get_mut(token)
            .ok_or_else(|| StoreError::NotFound("Refresh token not found".to_string()))?;

        if record.is_revoked {
            return Ok(false);
        }
        record.is_revoked = true;
        record.revoked_at = Some(now);
        if let Some(next) = replaced_by {
            record.replaced_by_token = Some(next.to_string());
        }
        Ok(true)
    }

    async fn discard(&self, token: &str) -> StoreResult<bool> {
        Ok(self.tokens.write().await.remove(token).is_some())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tokens = self.tokens.write().await;
        let mut revoked = 0;
        for record in tokens
            .values_mut()
            .filter(|r| r.user_id == user_id && !r.is_revoked)
        {
            record.is_revoked = true;
            record.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, r| r.expires_at >= now);
        Ok((before - tokens.len()) as u64)
    }
}

/// In-memory pets keyed by id
#[derive(Clone, Default)]
pub struct MemoryPetRepository {
    pets: Arc<RwLock<HashMap<Uuid, Pet>>>,
}

#[async_trait]
impl PetRepository for MemoryPetRepository {
    async fn insert(&self, pet: NewPet) -> StoreResult<Pet> {
        let now = Utc::now();
        let record = Pet {
            id: Uuid::new_v4(),
            owner: pet.owner,
            name: pet.name,
            breed: pet.breed,
            age: pet.age,
            weight: pet.weight,
            created_at: now,
            updated_at: now,
        };
        self.pets.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Pet>> {
        Ok(self.pets.read().await.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Pet>> {
        let pets = self.pets.read().await;
        let mut owned: Vec<Pet> = pets.values().filter(|p| p.owner == owner).cloned().collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update(&self, id: Uuid, changes: PetChanges) -> StoreResult<Pet> {
        let mut pets = self.pets.write().await;
        let pet = pets
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Pet not found".to_string()))?;

        if let Some(name) = changes.name {
            pet.name = name;
        }
        if let Some(breed) = changes.breed {
            pet.breed = Some(breed);
        }
        if let Some(age) = changes.age {
            pet.age = Some(age);
        }
        if let Some(weight) = changes.weight {
            pet.weight = Some(weight);
        }
        pet.updated_at = Utc::now();
        Ok(pet.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.pets.write().await.remove(&id).is_some())
    }
}

/// In-memory bookings keyed by id
#[derive(Clone, Default)]
pub struct MemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<Uuid, Booking>>>,
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn insert(&self, booking: NewBooking) -> StoreResult<Booking> {
        let now = Utc::now();
        let record = Booking {
            id: Uuid::new_v4(),
            user: booking.user,
            pet: booking.pet,
            service_type: booking.service_type,
            service_details: booking.service_details,
            date: booking.date,
            time_slot: booking.time_slot,
            status: BookingStatus::Requested,
            assigned_employee: None,
            created_at: now,
            updated_at: now,
        };
        self.bookings.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_by_user(&self, user: Uuid) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut mine: Vec<Booking> = bookings.values().filter(|b| b.user == user).cloned().collect();
        mine.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(mine)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        assign: Option<Uuid>,
    ) -> StoreResult<Option<Booking>> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id) {
            Some(booking) if booking.status == from => {
                booking.status = to;
                if assign.is_some() {
                    booking.assigned_employee = assign;
                }
                booking.updated_at = Utc::now();
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }
}
