//! Tenant-extensible lookup tables: establishment types and regional
//! document types. Rows without `establishmentRegistered` are the defaults
//! shared by every tenant.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_entity, EntityKind, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailableFor {
    Establishment,
    Unity,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentType {
    pub id: Uuid,
    pub name: String,
    pub available_for: AvailableFor,
    pub status: Status,
    #[serde(default)]
    pub establishment_registered: Option<Uuid>,
}

impl_entity!(EstablishmentType, EntityKind::EstablishmentType, lifecycle);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentTypeInput {
    #[validate(length(min = 1))]
    pub name: String,
    pub available_for: AvailableFor,
    #[serde(default)]
    pub status: Status,
    pub establishment_registered: Option<Uuid>,
}

impl EstablishmentTypeInput {
    pub fn into_type(self, id: Uuid) -> EstablishmentType {
        EstablishmentType {
            id,
            name: self.name,
            available_for: self.available_for,
            status: self.status,
            establishment_registered: self.establishment_registered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalDocumentType {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: String,
    pub status: Status,
    #[serde(default)]
    pub establishment_registered: Option<Uuid>,
}

impl_entity!(
    RegionalDocumentType,
    EntityKind::RegionalDocumentType,
    lifecycle
);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegionalDocumentTypeInput {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub abbreviation: String,
    #[serde(default)]
    pub status: Status,
    pub establishment_registered: Option<Uuid>,
}

impl RegionalDocumentTypeInput {
    pub fn into_type(self, id: Uuid) -> RegionalDocumentType {
        RegionalDocumentType {
            id,
            name: self.name,
            abbreviation: self.abbreviation,
            status: self.status,
            establishment_registered: self.establishment_registered,
        }
    }
}
