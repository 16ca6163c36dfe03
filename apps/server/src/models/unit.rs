use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_entity, AddressFields, EntityKind, Status, TargetCustomer};

/// A unit ("unity") belonging to an establishment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub cnpj: Option<String>,
    pub unity_type: String,
    #[serde(default)]
    pub especiality: Option<String>,
    pub main_phone: String,
    #[serde(default)]
    pub secondary_phone: Option<String>,
    pub email: String,
    pub status: Status,
    pub target_customer: TargetCustomer,
    pub unity_establishment: Uuid,
    #[serde(default)]
    pub unity_address: Option<Uuid>,
}

impl_entity!(Unit, EntityKind::Unit, lifecycle, address = unity_address);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnitInput {
    #[validate(length(min = 1))]
    pub name: String,
    pub abbreviation: Option<String>,
    pub cnpj: Option<String>,
    #[validate(length(min = 1))]
    pub unity_type: String,
    pub especiality: Option<String>,
    #[validate(length(min = 1))]
    pub main_phone: String,
    pub secondary_phone: Option<String>,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub status: Status,
    pub target_customer: TargetCustomer,
    /// Parent establishment. Accepted as `boundedTo` on create and
    /// `unityEstablishment` on update.
    #[serde(alias = "boundedTo")]
    pub unity_establishment: Uuid,
    #[serde(flatten)]
    pub address: AddressFields,
}

impl UnitInput {
    pub fn into_unit(self, id: Uuid, address: Option<Uuid>) -> (Unit, AddressFields) {
        let unit = Unit {
            id,
            name: self.name,
            abbreviation: self.abbreviation,
            cnpj: self.cnpj,
            unity_type: self.unity_type,
            especiality: self.especiality,
            main_phone: self.main_phone,
            secondary_phone: self.secondary_phone,
            email: self.email,
            status: self.status,
            target_customer: self.target_customer,
            unity_establishment: self.unity_establishment,
            unity_address: address,
        };
        (unit, self.address)
    }
}
