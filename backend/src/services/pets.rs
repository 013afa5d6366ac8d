//! Pet service
//!
//! Ownership is enforced here and only here: every lookup by id goes
//! through [`PetService::find_owned`], which bookings use as well.

use crate::error::ApiError;
use crate::repositories::{NewPet, PetChanges, PetRepository};
use pawcare_shared::models::Pet;
use pawcare_shared::types::{CreatePetRequest, UpdatePetRequest};
use pawcare_shared::validation::{parse_id, ValidateInput};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const MSG_INVALID_PET_ID: &str = "Invalid pet ID format";
pub const MSG_PET_NOT_FOUND: &str = "Pet not found";

#[derive(Clone)]
pub struct PetService {
    pets: Arc<dyn PetRepository>,
}

impl PetService {
    pub fn new(pets: Arc<dyn PetRepository>) -> Self {
        Self { pets }
    }

    pub async fn create(&self, owner: Uuid, req: CreatePetRequest) -> Result<Pet, ApiError> {
        let req = req.normalized();
        req.validate_input()?;

        let pet = self
            .pets
            .insert(NewPet {
                owner,
                name: req.name,
                breed: req.breed,
                age: req.age,
                weight: req.weight,
            })
            .await?;

        info!(pet_id = %pet.id, owner = %owner, "Pet created");
        Ok(pet)
    }

    /// Pets of the caller, newest first
    pub async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Pet>, ApiError> {
        Ok(self.pets.list_by_owner(owner).await?)
    }

    /// Load a pet the caller owns
    ///
    /// A pet owned by someone else is reported exactly like a missing one.
    pub async fn find_with_ownership(&self, pet_id: &str, owner: Uuid) -> Result<Pet, ApiError> {
        let id = parse_id(pet_id).ok_or_else(|| ApiError::BadRequest(MSG_INVALID_PET_ID.to_string()))?;

        self.find_owned(id, owner)
            .await?
            .ok_or_else(|| ApiError::NotFound(MSG_PET_NOT_FOUND.to_string()))
    }

    /// The pet with `id` if `owner` owns it
    pub async fn find_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Pet>, ApiError> {
        Ok(self.pets.find_by_id(id).await?.filter(|pet| pet.owner == owner))
    }

    pub async fn update(&self, pet_id: &str, owner: Uuid, req: UpdatePetRequest) -> Result<Pet, ApiError> {
        let req = req.normalized();
        req.validate_input()?;

        let pet = self.find_with_ownership(pet_id, owner).await?;
        let changes = PetChanges {
            name: req.name,
            breed: req.breed,
            age: req.age,
            weight: req.weight,
        };
        Ok(self.pets.update(pet.id, changes).await?)
    }

    pub async fn delete(&self, pet_id: &str, owner: Uuid) -> Result<(), ApiError> {
        let pet = self.find_with_ownership(pet_id, owner).await?;
        if !self.pets.delete(pet.id).await? {
            return Err(ApiError::NotFound(MSG_PET_NOT_FOUND.to_string()));
        }
        info!(pet_id = %pet.id, "Pet deleted");
        Ok(())
    }
}
