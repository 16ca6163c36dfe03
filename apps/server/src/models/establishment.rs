use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_entity, AddressFields, EntityKind, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetCustomer {
    Human,
    Animal,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Establishment {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: String,
    pub cnpj: String,
    pub establishment_type: String,
    #[serde(default)]
    pub especiality: Option<String>,
    pub main_phone: String,
    #[serde(default)]
    pub secondary_phone: Option<String>,
    pub email: String,
    pub status: Status,
    pub target_customer: TargetCustomer,
    #[serde(default)]
    pub establishment_address: Option<Uuid>,
}

impl_entity!(
    Establishment,
    EntityKind::Establishment,
    lifecycle,
    address = establishment_address
);

/// Create and update payload for establishments.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentInput {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub abbreviation: String,
    #[validate(length(min = 1))]
    pub cnpj: String,
    #[validate(length(min = 1))]
    pub establishment_type: String,
    pub especiality: Option<String>,
    #[validate(length(min = 1))]
    pub main_phone: String,
    pub secondary_phone: Option<String>,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub status: Status,
    pub target_customer: TargetCustomer,
    #[serde(flatten)]
    pub address: AddressFields,
}

impl EstablishmentInput {
    pub fn into_establishment(self, id: Uuid, address: Option<Uuid>) -> (Establishment, AddressFields) {
        let establishment = Establishment {
            id,
            name: self.name,
            abbreviation: self.abbreviation,
            cnpj: self.cnpj,
            establishment_type: self.establishment_type,
            especiality: self.especiality,
            main_phone: self.main_phone,
            secondary_phone: self.secondary_phone,
            email: self.email,
            status: self.status,
            target_customer: self.target_customer,
            establishment_address: address,
        };
        (establishment, self.address)
    }
}
