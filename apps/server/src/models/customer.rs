use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_entity, AddressFields, EntityKind, PetInput, Status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub other_document: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cns: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub main_phone: Option<String>,
    #[serde(default)]
    pub secondary_phone: Option<String>,
    pub is_patient: bool,
    pub is_responsible: bool,
    pub is_tutor: bool,
    pub status: Status,
    pub customer_establishment: Uuid,
    #[serde(default)]
    pub customer_address: Option<Uuid>,
}

impl_entity!(
    Customer,
    EntityKind::Customer,
    lifecycle,
    address = customer_address
);

/// Links a patient to the customer responsible for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponsible {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub responsible_id: Uuid,
}

impl_entity!(PatientResponsible, EntityKind::PatientResponsible);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[validate(length(min = 1))]
    pub name: String,
    pub cpf: Option<String>,
    pub other_document: Option<String>,
    pub email: Option<String>,
    pub cns: Option<String>,
    pub birth_date: Option<String>,
    pub main_phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub is_patient: bool,
    pub is_responsible: bool,
    pub is_tutor: bool,
    #[serde(default)]
    pub status: Status,
    pub establishment_bounded: Uuid,
    #[serde(flatten)]
    pub address: AddressFields,
    /// Patients this customer becomes responsible for (create).
    #[serde(default)]
    pub patients_responsible_id_list: Vec<Uuid>,
    #[serde(default)]
    pub patients_responsible_id_list_to_add: Vec<Uuid>,
    #[serde(default)]
    pub patients_responsible_id_list_to_remove: Vec<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub pets_list: Vec<PetInput>,
}

impl CustomerInput {
    /// Splits the payload into the customer document and its relation data.
    pub fn into_customer(
        self,
        id: Uuid,
        establishment: Uuid,
        address: Option<Uuid>,
    ) -> (Customer, CustomerRelations) {
        let customer = Customer {
            id,
            name: self.name,
            cpf: self.cpf,
            other_document: self.other_document,
            email: self.email,
            cns: self.cns,
            birth_date: self.birth_date,
            main_phone: self.main_phone,
            secondary_phone: self.secondary_phone,
            is_patient: self.is_patient,
            is_responsible: self.is_responsible,
            is_tutor: self.is_tutor,
            status: self.status,
            customer_establishment: establishment,
            customer_address: address,
        };
        let mut patients_to_add = self.patients_responsible_id_list;
        patients_to_add.extend(self.patients_responsible_id_list_to_add);
        let relations = CustomerRelations {
            address: self.address,
            patients_to_add,
            patients_to_remove: self.patients_responsible_id_list_to_remove,
            pets: self.pets_list,
        };
        (customer, relations)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerRelations {
    pub address: AddressFields,
    pub patients_to_add: Vec<Uuid>,
    pub patients_to_remove: Vec<Uuid>,
    pub pets: Vec<PetInput>,
}
