use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_entity, AddressFields, EntityKind, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfessionalRole {
    HealthProfessional,
    Manager,
    Responsible,
    Administrator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoundedTo {
    Establishment,
    Unity,
}

/// Stored professional. `password` holds the bcrypt hash and is never
/// projected into responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub role: ProfessionalRole,
    #[serde(default)]
    pub birth_date: Option<String>,
    pub status: Status,
    pub password: String,
    #[serde(default)]
    pub especiality: Option<String>,
    pub bounded_to: BoundedTo,
    pub establishment_bounded: Uuid,
    #[serde(default)]
    pub unity_bounded: Option<Uuid>,
    #[serde(default)]
    pub regional_document: Option<String>,
    #[serde(default)]
    pub regional_document_type: Option<Uuid>,
    #[serde(default)]
    pub state_document_issued: Option<String>,
    #[serde(default)]
    pub professional_address: Option<Uuid>,
}

impl_entity!(
    Professional,
    EntityKind::Professional,
    lifecycle,
    address = professional_address
);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalInput {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub cpf: String,
    #[validate(length(min = 1))]
    pub phone: String,
    pub role: ProfessionalRole,
    pub birth_date: Option<String>,
    #[serde(default)]
    pub status: Status,
    /// Plain text. Required on create; empty or absent on update keeps the
    /// stored hash.
    pub password: Option<String>,
    pub especiality: Option<String>,
    pub bounded_to: BoundedTo,
    pub establishment_bounded: Uuid,
    pub unity_bounded: Option<Uuid>,
    pub regional_document: Option<String>,
    pub regional_document_type: Option<Uuid>,
    pub state_document_issued: Option<String>,
    #[serde(flatten)]
    pub address: AddressFields,
}

impl ProfessionalInput {
    /// Password supplied by the client, if any. Blank counts as absent.
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    pub fn into_professional(
        self,
        id: Uuid,
        password_hash: String,
        address: Option<Uuid>,
    ) -> (Professional, AddressFields) {
        let professional = Professional {
            id,
            name: self.name,
            email: self.email,
            cpf: self.cpf,
            phone: self.phone,
            role: self.role,
            birth_date: self.birth_date,
            status: self.status,
            password: password_hash,
            especiality: self.especiality,
            bounded_to: self.bounded_to,
            establishment_bounded: self.establishment_bounded,
            unity_bounded: self.unity_bounded,
            regional_document: self.regional_document,
            regional_document_type: self.regional_document_type,
            state_document_issued: self.state_document_issued,
            professional_address: address,
        };
        (professional, self.address)
    }
}
