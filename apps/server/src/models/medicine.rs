use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_entity, EntityKind, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PharmaceuticalForm {
    Comprimido,
    Capsula,
    Dragea,
    Pastilha,
    Supositorio,
    Pomada,
    Creme,
    Gel,
    Xarope,
    Gota,
    Nasal,
    Oftalmica,
    Injetavel,
    Spray,
    Aerossol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegulatoryCategory {
    Fitoterapico,
    Inovador,
    Novo,
    Similar,
    Biologico,
    Especifico,
    Generico,
    Dinamizado,
    Sintetico,
    Radiofarmaco,
    Industrializado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MedicineUse {
    Human,
    Animal,
    Both,
}

/// Catalog medicine. Without `establishmentRegistered` it belongs to the
/// global catalog visible to every tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub pharmaceutical_form: PharmaceuticalForm,
    #[serde(default)]
    pub regulatory_category: Option<RegulatoryCategory>,
    #[serde(default)]
    pub active_ingredient: Option<String>,
    pub for_use: MedicineUse,
    pub status: Status,
    #[serde(default)]
    pub establishment_registered: Option<Uuid>,
}

impl_entity!(Medicine, EntityKind::Medicine, lifecycle);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInput {
    #[validate(length(min = 1))]
    pub name: String,
    pub pharmaceutical_form: PharmaceuticalForm,
    pub regulatory_category: Option<RegulatoryCategory>,
    pub active_ingredient: Option<String>,
    pub for_use: MedicineUse,
    #[serde(default)]
    pub status: Status,
    pub establishment_registered: Option<Uuid>,
}

impl MedicineInput {
    pub fn into_medicine(self, id: Uuid) -> Medicine {
        Medicine {
            id,
            name: self.name,
            pharmaceutical_form: self.pharmaceutical_form,
            regulatory_category: self.regulatory_category,
            active_ingredient: self.active_ingredient,
            for_use: self.for_use,
            status: self.status,
            establishment_registered: self.establishment_registered,
        }
    }
}
