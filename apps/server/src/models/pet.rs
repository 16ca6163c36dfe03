use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_entity, EntityKind, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetSex {
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: Uuid,
    pub pet_name: String,
    pub specie: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    pub size: PetSize,
    pub sex: PetSex,
    pub status: Status,
    pub establishment_registered: Uuid,
    pub customer_owner: Uuid,
}

impl_entity!(Pet, EntityKind::Pet, lifecycle);

/// Pet registered together with its owner.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PetInput {
    #[validate(length(min = 1))]
    pub pet_name: String,
    #[validate(length(min = 1))]
    pub specie: String,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub size: PetSize,
    pub sex: PetSex,
    #[serde(default)]
    pub status: Status,
}

impl PetInput {
    pub fn into_pet(self, owner: Uuid, establishment: Uuid) -> Pet {
        Pet {
            id: Uuid::new_v4(),
            pet_name: self.pet_name,
            specie: self.specie,
            breed: self.breed,
            age: self.age,
            size: self.size,
            sex: self.sex,
            status: self.status,
            establishment_registered: establishment,
            customer_owner: owner,
        }
    }
}
