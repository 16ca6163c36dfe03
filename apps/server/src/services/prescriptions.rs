//! Prescription service
//!
//! A prescription and its prescribed medicines are written together. The
//! rendered PDF is produced once, on first request, and kept as the
//! prescription's attachment.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    projection::{self, ListParams, Listing},
    render::{DocumentRenderer, PrescribedLine, PrescriptionDocument, TemplateKind},
};
use crate::{
    config::PaginationConfig,
    db::{self, Predicate, RecordQuery, Store, UnitOfWork},
    models::{
        AddressFields, Customer, Entity, Establishment, Medicine, Pet, PrescribedMedicine,
        Prescription, PrescriptionInput, PrescriptionSubject, Professional, RegionalDocumentType,
    },
    Result,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedicineView {
    #[serde(flatten)]
    pub prescribed: PrescribedMedicine,
    pub medicine_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionView {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub establishment_name: Option<String>,
    pub establishment_address: AddressFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutor_cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutor_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_specie: Option<String>,
    pub professional_name: Option<String>,
    pub professional_cpf: Option<String>,
    pub medicine_prescribed_list: Vec<PrescribedMedicineView>,
}

/// Everything a prescription points at, looked up once.
struct Resolved {
    prescription: Prescription,
    establishment: Option<Establishment>,
    establishment_address: AddressFields,
    professional: Option<Professional>,
    document_type: Option<RegionalDocumentType>,
    patient: Option<Customer>,
    tutor: Option<Customer>,
    pet: Option<Pet>,
    medicines: Vec<PrescribedMedicineView>,
}

async fn resolve(uow: &mut dyn UnitOfWork, prescription: Prescription) -> Result<Resolved> {
    let establishment =
        db::get::<Establishment>(uow, prescription.establishment_prescription).await?;
    let establishment_address = projection::address_fields(
        uow,
        establishment.as_ref().and_then(|e| e.establishment_address),
    )
    .await?;

    let professional = db::get::<Professional>(uow, prescription.professional_prescription).await?;
    let document_type = match professional.as_ref().and_then(|p| p.regional_document_type) {
        Some(id) => db::get::<RegionalDocumentType>(uow, id).await?,
        None => None,
    };

    let (patient, tutor, pet) = match prescription.subject {
        PrescriptionSubject::Medic {
            patient_prescription,
        } => (
            db::get::<Customer>(uow, patient_prescription).await?,
            None,
            None,
        ),
        PrescriptionSubject::Veterinary {
            tutor_prescription,
            pet_prescription,
        } => (
            None,
            db::get::<Customer>(uow, tutor_prescription).await?,
            db::get::<Pet>(uow, pet_prescription).await?,
        ),
    };

    let prescribed = db::list::<PrescribedMedicine>(
        uow,
        &RecordQuery::new(vec![Predicate::eq("prescriptionId", prescription.id)]),
    )
    .await?;
    let mut medicines = Vec::with_capacity(prescribed.items.len());
    for prescribed in prescribed.items {
        let medicine = db::get::<Medicine>(uow, prescribed.medicine_id).await?;
        medicines.push(PrescribedMedicineView {
            prescribed,
            medicine_name: medicine.map(|m| m.name),
        });
    }

    Ok(Resolved {
        prescription,
        establishment,
        establishment_address,
        professional,
        document_type,
        patient,
        tutor,
        pet,
        medicines,
    })
}

impl Resolved {
    fn into_view(self) -> PrescriptionView {
        PrescriptionView {
            prescription: self.prescription,
            establishment_name: self.establishment.map(|e| e.name),
            establishment_address: self.establishment_address,
            patient_name: self.patient.as_ref().map(|c| c.name.clone()),
            patient_cpf: self.patient.as_ref().and_then(|c| c.cpf.clone()),
            patient_document: self.patient.and_then(|c| c.other_document),
            tutor_name: self.tutor.as_ref().map(|c| c.name.clone()),
            tutor_cpf: self.tutor.as_ref().and_then(|c| c.cpf.clone()),
            tutor_document: self.tutor.and_then(|c| c.other_document),
            pet_name: self.pet.as_ref().map(|p| p.pet_name.clone()),
            pet_specie: self.pet.map(|p| p.specie),
            professional_name: self.professional.as_ref().map(|p| p.name.clone()),
            professional_cpf: self.professional.map(|p| p.cpf),
            medicine_prescribed_list: self.medicines,
        }
    }

    fn template(&self) -> TemplateKind {
        match self.prescription.subject {
            PrescriptionSubject::Medic { .. } => TemplateKind::PatientPrescription,
            PrescriptionSubject::Veterinary { .. } => TemplateKind::PetPrescription,
        }
    }

    fn into_document(self) -> PrescriptionDocument {
        let administration_way = |p: &PrescribedMedicine| {
            serde_json::to_value(p.administration_way)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default()
        };
        PrescriptionDocument {
            emission_date: display_date(self.prescription.emission_date),
            expiration_date: display_date(self.prescription.expiration_date),
            observation: self.prescription.observation,
            establishment_name: self.establishment.as_ref().map(|e| e.name.clone()),
            establishment_phone: self.establishment.map(|e| e.main_phone),
            establishment_address: self.establishment_address,
            patient_name: self.patient.map(|c| c.name),
            tutor_name: self.tutor.map(|c| c.name),
            pet_name: self.pet.as_ref().map(|p| p.pet_name.clone()),
            pet_specie: self.pet.map(|p| p.specie),
            professional_name: self.professional.as_ref().map(|p| p.name.clone()),
            professional_phone: self.professional.as_ref().map(|p| p.phone.clone()),
            professional_document: self.professional.and_then(|p| p.regional_document),
            professional_document_type: self.document_type.map(|t| t.abbreviation),
            medicines: self
                .medicines
                .iter()
                .map(|m| PrescribedLine {
                    medicine_name: m.medicine_name.clone(),
                    dosage: m.prescribed.dosage.clone(),
                    total_amount: m.prescribed.total_amount.clone(),
                    administration_way: administration_way(&m.prescribed),
                })
                .collect(),
        }
    }
}

/// `YYYY-MM-DD` as printed on documents.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[derive(Debug, Clone, Default)]
pub struct PrescriptionFilter {
    pub from_establishment: Option<Uuid>,
}

pub struct PrescriptionService {
    store: Arc<dyn Store>,
    renderer: Arc<dyn DocumentRenderer>,
    pagination: PaginationConfig,
}

impl PrescriptionService {
    pub fn new(
        store: Arc<dyn Store>,
        renderer: Arc<dyn DocumentRenderer>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            store,
            renderer,
            pagination,
        }
    }

    pub async fn create(&self, input: PrescriptionInput) -> Result<PrescriptionView> {
        let (prescription, medicines) = input.into_prescription(Uuid::new_v4())?;

        let mut uow = self.store.begin().await?;
        db::require_reference::<Establishment>(
            uow.as_mut(),
            prescription.establishment_prescription,
            "establishmentPrescription",
        )
        .await?;
        db::require_reference::<Professional>(
            uow.as_mut(),
            prescription.professional_prescription,
            "professionalPrescription",
        )
        .await?;
        match prescription.subject {
            PrescriptionSubject::Medic {
                patient_prescription,
            } => {
                db::require_reference::<Customer>(
                    uow.as_mut(),
                    patient_prescription,
                    "patientPrescription",
                )
                .await?;
            }
            PrescriptionSubject::Veterinary {
                tutor_prescription,
                pet_prescription,
            } => {
                db::require_reference::<Customer>(
                    uow.as_mut(),
                    tutor_prescription,
                    "tutorPrescription",
                )
                .await?;
                db::require_reference::<Pet>(uow.as_mut(), pet_prescription, "petPrescription")
                    .await?;
            }
        }
        for prescribed in &medicines {
            db::require_reference::<Medicine>(
                uow.as_mut(),
                prescribed.medicine_id,
                "medicinesPrescribedList",
            )
            .await?;
        }

        db::insert(uow.as_mut(), &prescription).await?;
        for prescribed in &medicines {
            db::insert(uow.as_mut(), prescribed).await?;
        }

        let created = resolve(uow.as_mut(), prescription).await?.into_view();
        uow.commit().await?;

        tracing::info!(
            prescription_id = %created.prescription.id,
            prescription_type = ?created.prescription.subject.prescription_type(),
            medicines = created.medicine_prescribed_list.len(),
            "prescription created"
        );
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<PrescriptionView> {
        let mut uow = self.store.begin().await?;
        let prescription = db::require::<Prescription>(uow.as_mut(), id).await?;
        Ok(resolve(uow.as_mut(), prescription).await?.into_view())
    }

    pub async fn list(
        &self,
        filter: &PrescriptionFilter,
        params: &ListParams,
    ) -> Result<Listing<PrescriptionView>> {
        let mut predicates = Vec::new();
        if let Some(establishment) = filter.from_establishment {
            predicates.push(Predicate::eq("establishmentPrescription", establishment));
        }
        let mut query = RecordQuery::new(predicates);
        params.window(&self.pagination, &mut query)?;

        let mut uow = self.store.begin().await?;
        let page = db::list::<Prescription>(uow.as_mut(), &query).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for prescription in page.items {
            items.push(resolve(uow.as_mut(), prescription).await?.into_view());
        }
        Ok(params.listing(items, page.total))
    }

    /// The prescription's PDF. Rendered on the first call and stored; later
    /// calls return the stored bytes.
    pub async fn pdf(&self, id: Uuid) -> Result<Vec<u8>> {
        let resolved = {
            let mut uow = self.store.begin().await?;
            let prescription = db::require::<Prescription>(uow.as_mut(), id).await?;
            if let Some(bytes) = uow.fetch_attachment(Prescription::KIND, id).await? {
                tracing::debug!(prescription_id = %id, "serving stored prescription document");
                return Ok(bytes);
            }
            resolve(uow.as_mut(), prescription).await?
        };

        let template = resolved.template();
        let bytes = self
            .renderer
            .render(template, &resolved.into_document())
            .await?;

        let mut uow = self.store.begin().await?;
        uow.store_attachment(Prescription::KIND, id, &bytes).await?;
        uow.commit().await?;

        tracing::info!(prescription_id = %id, bytes = bytes.len(), "prescription document stored");
        Ok(bytes)
    }
}
