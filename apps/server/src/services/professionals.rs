//! Professional service

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    projection::{self, EstablishmentLabel, ListParams, Listing},
    uniqueness, upsert,
};
use crate::{
    auth,
    config::PaginationConfig,
    db::{self, Predicate, RecordQuery, Store, UnitOfWork},
    models::{
        AddressFields, BoundedTo, Establishment, Professional, ProfessionalInput,
        ProfessionalRole, RegionalDocumentType, Status, Unit,
    },
    Error, Result,
};

const SEARCH_FIELDS: &[&str] = &[
    "name",
    "email",
    "cpf",
    "phone",
    "regionalDocument",
    "especiality",
];

/// Professional as returned to clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub role: ProfessionalRole,
    pub birth_date: Option<String>,
    pub status: Status,
    pub especiality: Option<String>,
    pub bounded_to: BoundedTo,
    pub establishment_bounded: Uuid,
    pub unity_bounded: Option<Uuid>,
    pub regional_document: Option<String>,
    pub regional_document_type: Option<Uuid>,
    pub state_document_issued: Option<String>,
    pub professional_address: Option<Uuid>,
    #[serde(flatten)]
    pub address: AddressFields,
    pub establishment_bounded_name: Option<String>,
    pub establishment_bounded_abbreviation: Option<String>,
}

async fn view(uow: &mut dyn UnitOfWork, p: Professional) -> Result<ProfessionalView> {
    let address = projection::address_fields(uow, p.professional_address).await?;
    let EstablishmentLabel { name, abbreviation } =
        projection::establishment_label(uow, Some(p.establishment_bounded)).await?;
    Ok(ProfessionalView {
        id: p.id,
        name: p.name,
        email: p.email,
        cpf: p.cpf,
        phone: p.phone,
        role: p.role,
        birth_date: p.birth_date,
        status: p.status,
        especiality: p.especiality,
        bounded_to: p.bounded_to,
        establishment_bounded: p.establishment_bounded,
        unity_bounded: p.unity_bounded,
        regional_document: p.regional_document,
        regional_document_type: p.regional_document_type,
        state_document_issued: p.state_document_issued,
        professional_address: p.professional_address,
        address,
        establishment_bounded_name: name,
        establishment_bounded_abbreviation: abbreviation,
    })
}

/// List filters beyond paging and search.
#[derive(Debug, Clone, Default)]
pub struct ProfessionalFilter {
    pub from_establishment: Option<Uuid>,
    /// Only professionals holding a regional (council) document.
    pub health_professionals_only: bool,
}

impl ProfessionalFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(establishment) = self.from_establishment {
            predicates.push(Predicate::eq("establishmentBounded", establishment));
        }
        if self.health_professionals_only {
            predicates.push(Predicate::NotNull("regionalDocument"));
        }
        predicates
    }
}

pub struct ProfessionalService {
    store: Arc<dyn Store>,
    pagination: PaginationConfig,
    bcrypt_cost: u32,
}

impl ProfessionalService {
    pub fn new(store: Arc<dyn Store>, pagination: PaginationConfig, bcrypt_cost: u32) -> Self {
        Self {
            store,
            pagination,
            bcrypt_cost,
        }
    }

    async fn check_references(uow: &mut dyn UnitOfWork, professional: &Professional) -> Result<()> {
        db::require_reference::<Establishment>(
            uow,
            professional.establishment_bounded,
            "establishmentBounded",
        )
        .await?;
        if let Some(unit) = professional.unity_bounded {
            db::require_reference::<Unit>(uow, unit, "unityBounded").await?;
        }
        if let Some(document_type) = professional.regional_document_type {
            db::require_reference::<RegionalDocumentType>(
                uow,
                document_type,
                "regionalDocumentType",
            )
            .await?;
        }
        Ok(())
    }

    pub async fn create(&self, input: ProfessionalInput) -> Result<ProfessionalView> {
        let password = input
            .new_password()
            .ok_or_else(|| Error::Validation("Invalid fields: password".to_string()))?;
        if password.len() < 6 {
            return Err(Error::Validation("Invalid fields: password".to_string()));
        }
        let hash = auth::hash_password(password, self.bcrypt_cost).await?;

        let mut uow = self.store.begin().await?;
        let (professional, address) = input.into_professional(Uuid::new_v4(), hash, None);
        uniqueness::ensure_unique(uow.as_mut(), &professional, None).await?;
        Self::check_references(uow.as_mut(), &professional).await?;
        let professional =
            upsert::insert_with_address(uow.as_mut(), professional, &address).await?;
        let created = view(uow.as_mut(), professional).await?;
        uow.commit().await?;

        tracing::info!(
            professional_id = %created.id,
            establishment_id = %created.establishment_bounded,
            "professional created"
        );
        Ok(created)
    }

    /// A blank password keeps the stored hash.
    pub async fn update(&self, id: Uuid, input: ProfessionalInput) -> Result<ProfessionalView> {
        let new_hash = match input.new_password() {
            Some(password) if password.len() < 6 => {
                return Err(Error::Validation("Invalid fields: password".to_string()))
            }
            Some(password) => Some(auth::hash_password(password, self.bcrypt_cost).await?),
            None => None,
        };

        let mut uow = self.store.begin().await?;
        let previous = db::require::<Professional>(uow.as_mut(), id).await?;
        let hash = new_hash.unwrap_or_else(|| previous.password.clone());
        let (next, address) = input.into_professional(id, hash, previous.professional_address);
        uniqueness::ensure_unique(uow.as_mut(), &next, Some(&previous)).await?;
        Self::check_references(uow.as_mut(), &next).await?;
        let stored = upsert::rewrite_with_address(uow.as_mut(), &previous, next, &address).await?;
        let updated = view(uow.as_mut(), stored).await?;
        uow.commit().await?;

        tracing::info!(professional_id = %id, "professional updated");
        Ok(updated)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<()> {
        upsert::deactivate::<Professional>(self.store.as_ref(), id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<ProfessionalView> {
        let mut uow = self.store.begin().await?;
        let professional = db::require::<Professional>(uow.as_mut(), id).await?;
        view(uow.as_mut(), professional).await
    }

    pub async fn list(
        &self,
        filter: &ProfessionalFilter,
        params: &ListParams,
    ) -> Result<Listing<ProfessionalView>> {
        let mut predicates = filter.predicates();
        predicates.extend(Predicate::search(SEARCH_FIELDS, params.search()));
        let mut query = RecordQuery::new(predicates);
        params.window(&self.pagination, &mut query)?;

        let mut uow = self.store.begin().await?;
        let page = db::list::<Professional>(uow.as_mut(), &query).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for professional in page.items {
            items.push(view(uow.as_mut(), professional).await?);
        }
        Ok(params.listing(items, page.total))
    }
}
