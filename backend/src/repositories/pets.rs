//! Pet repository

use super::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pawcare_shared::models::Pet;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Input for creating a pet
#[derive(Debug, Clone)]
pub struct NewPet {
    pub owner: Uuid,
    pub name: String,
    pub breed: Option<String>,
    pub age: Option<f64>,
    pub weight: Option<f64>,
}

/// Partial pet update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct PetChanges {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub age: Option<f64>,
    pub weight: Option<f64>,
}

#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn insert(&self, pet: NewPet) -> StoreResult<Pet>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Pet>>;

    /// Pets of one owner, newest first
    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Pet>>;

    async fn update(&self, id: Uuid, changes: PetChanges) -> StoreResult<Pet>;

    /// Returns false when no such pet existed
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Pet row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PetRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub breed: Option<String>,
    pub age: Option<f64>,
    pub weight_kg: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PetRecord> for Pet {
    fn from(row: PetRecord) -> Self {
        Self {
            id: row.id,
            owner: row.owner_id,
            name: row.name,
            breed: row.breed,
            age: row.age,
            weight: row.weight_kg.and_then(|w| w.to_f64()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres-backed pet repository
#[derive(Clone)]
pub struct PgPetRepository {
    pool: PgPool,
}

impl PgPetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PetRepository for PgPetRepository {
    async fn insert(&self, pet: NewPet) -> StoreResult<Pet> {
        let row = sqlx::query_as::<_, PetRecord>(
            r#"
            INSERT INTO pets (owner_id, name, breed, age, weight_kg)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, name, breed, age, weight_kg, created_at, updated_at
            "#,
        )
        .bind(pet.owner)
        .bind(&pet.name)
        .bind(&pet.breed)
        .bind(pet.age)
        .bind(pet.weight.and_then(Decimal::from_f64))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Pet>> {
        let row = sqlx::query_as::<_, PetRecord>(
            r#"
            SELECT id, owner_id, name, breed, age, weight_kg, created_at, updated_at
            FROM pets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Pet>> {
        let rows = sqlx::query_as::<_, PetRecord>(
            r#"
            SELECT id, owner_id, name, breed, age, weight_kg, created_at, updated_at
            FROM pets
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: Uuid, changes: PetChanges) -> StoreResult<Pet> {
        let row = sqlx::query_as::<_, PetRecord>(
            r#"
            UPDATE pets SET
                name = COALESCE($2, name),
                breed = COALESCE($3, breed),
                age = COALESCE($4, age),
                weight_kg = COALESCE($5, weight_kg),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, name, breed, age, weight_kg, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.breed)
        .bind(changes.age)
        .bind(changes.weight.and_then(Decimal::from_f64))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Pet not found".to_string()))?;

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM pets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
