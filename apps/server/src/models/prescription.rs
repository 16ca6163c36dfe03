use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_entity, EntityKind};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionType {
    Medic,
    Veterinary,
}

/// Who a prescription is written for. The tag doubles as the stored
/// `prescriptionType`, so a MEDIC prescription can never carry a pet and a
/// VETERINARY one can never lack its tutor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "prescriptionType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionSubject {
    #[serde(rename_all = "camelCase")]
    Medic { patient_prescription: Uuid },
    #[serde(rename_all = "camelCase")]
    Veterinary {
        tutor_prescription: Uuid,
        pet_prescription: Uuid,
    },
}

impl PrescriptionSubject {
    pub fn prescription_type(&self) -> PrescriptionType {
        match self {
            Self::Medic { .. } => PrescriptionType::Medic,
            Self::Veterinary { .. } => PrescriptionType::Veterinary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: Uuid,
    pub emission_date: NaiveDate,
    pub expiration_date: NaiveDate,
    #[serde(default)]
    pub observation: Option<String>,
    pub establishment_prescription: Uuid,
    pub professional_prescription: Uuid,
    #[serde(flatten)]
    pub subject: PrescriptionSubject,
}

impl_entity!(Prescription, EntityKind::Prescription);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdministrationWay {
    Oral,
    Sublingual,
    Bucal,
    Retal,
    Vaginal,
    Intravenosa,
    Intramuscular,
    Subcutanea,
    Intradermica,
    Inalatoria,
    Nasaloftalmica,
    Otologica,
    Topica,
    Transdermica,
    IntraArticular,
    Intraperitoneal,
    Epidural,
    Intratecal,
    Intracardiaca,
    Uretral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedicine {
    pub id: Uuid,
    pub prescription_id: Uuid,
    pub medicine_id: Uuid,
    pub dosage: String,
    pub total_amount: String,
    pub administration_way: AdministrationWay,
}

impl_entity!(PrescribedMedicine, EntityKind::PrescribedMedicine);

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedicineInput {
    pub medicine_id: Uuid,
    #[validate(length(min = 1))]
    pub dosage: String,
    #[validate(length(min = 1))]
    pub total_amount: String,
    pub administration_way: AdministrationWay,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionInput {
    pub emission_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub observation: Option<String>,
    pub establishment_prescription: Uuid,
    pub professional_prescription: Uuid,
    pub prescription_type: PrescriptionType,
    pub patient_prescription: Option<Uuid>,
    pub tutor_prescription: Option<Uuid>,
    pub pet_prescription: Option<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub medicines_prescribed_list: Vec<PrescribedMedicineInput>,
}

impl PrescriptionInput {
    /// Resolves the subject for the declared type. Identifiers belonging to
    /// the other type are dropped.
    pub fn subject(&self) -> Result<PrescriptionSubject> {
        fn required(value: Option<Uuid>, field: &str) -> Result<Uuid> {
            value.ok_or_else(|| {
                Error::conflict(field, format!("{field} is required for this prescription type"))
            })
        }

        match self.prescription_type {
            PrescriptionType::Medic => Ok(PrescriptionSubject::Medic {
                patient_prescription: required(self.patient_prescription, "patientPrescription")?,
            }),
            PrescriptionType::Veterinary => Ok(PrescriptionSubject::Veterinary {
                tutor_prescription: required(self.tutor_prescription, "tutorPrescription")?,
                pet_prescription: required(self.pet_prescription, "petPrescription")?,
            }),
        }
    }

    pub fn into_prescription(self, id: Uuid) -> Result<(Prescription, Vec<PrescribedMedicine>)> {
        if self.expiration_date < self.emission_date {
            return Err(Error::Validation(
                "expirationDate must not precede emissionDate".to_string(),
            ));
        }
        let subject = self.subject()?;
        let medicines = self
            .medicines_prescribed_list
            .into_iter()
            .map(|m| PrescribedMedicine {
                id: Uuid::new_v4(),
                prescription_id: id,
                medicine_id: m.medicine_id,
                dosage: m.dosage,
                total_amount: m.total_amount,
                administration_way: m.administration_way,
            })
            .collect();
        let prescription = Prescription {
            id,
            emission_date: self.emission_date,
            expiration_date: self.expiration_date,
            observation: self.observation,
            establishment_prescription: self.establishment_prescription,
            professional_prescription: self.professional_prescription,
            subject,
        };
        Ok((prescription, medicines))
    }
}
