//! Establishment service

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    projection::{self, ListParams, Listing},
    upsert,
};
use crate::{
    config::PaginationConfig,
    db::{self, Predicate, RecordQuery, Store, UnitOfWork},
    models::{AddressFields, Establishment, EstablishmentInput},
    Result,
};

const SEARCH_FIELDS: &[&str] = &[
    "name",
    "abbreviation",
    "cnpj",
    "especiality",
    "mainPhone",
    "secondaryPhone",
    "email",
];

#[derive(Debug, Clone, Serialize)]
pub struct EstablishmentView {
    #[serde(flatten)]
    pub establishment: Establishment,
    #[serde(flatten)]
    pub address: AddressFields,
}

async fn view(uow: &mut dyn UnitOfWork, establishment: Establishment) -> Result<EstablishmentView> {
    let address = projection::address_fields(uow, establishment.establishment_address).await?;
    Ok(EstablishmentView {
        establishment,
        address,
    })
}

pub struct EstablishmentService {
    store: Arc<dyn Store>,
    pagination: PaginationConfig,
}

impl EstablishmentService {
    pub fn new(store: Arc<dyn Store>, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    pub async fn create(&self, input: EstablishmentInput) -> Result<EstablishmentView> {
        let mut uow = self.store.begin().await?;
        let (establishment, address) = input.into_establishment(Uuid::new_v4(), None);
        let establishment =
            upsert::create_with_address(uow.as_mut(), establishment, &address).await?;
        let created = view(uow.as_mut(), establishment).await?;
        uow.commit().await?;

        tracing::info!(establishment_id = %created.establishment.id, "establishment created");
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, input: EstablishmentInput) -> Result<EstablishmentView> {
        let mut uow = self.store.begin().await?;
        let previous = db::require::<Establishment>(uow.as_mut(), id).await?;
        let (next, address) = input.into_establishment(id, previous.establishment_address);
        let stored = upsert::update_with_address(uow.as_mut(), &previous, next, &address).await?;
        let updated = view(uow.as_mut(), stored).await?;
        uow.commit().await?;

        tracing::info!(establishment_id = %id, "establishment updated");
        Ok(updated)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<()> {
        upsert::deactivate::<Establishment>(self.store.as_ref(), id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<EstablishmentView> {
        let mut uow = self.store.begin().await?;
        let establishment = db::require::<Establishment>(uow.as_mut(), id).await?;
        view(uow.as_mut(), establishment).await
    }

    pub async fn list(&self, params: &ListParams) -> Result<Listing<EstablishmentView>> {
        let mut query = RecordQuery::new(
            Predicate::search(SEARCH_FIELDS, params.search())
                .into_iter()
                .collect(),
        );
        params.window(&self.pagination, &mut query)?;

        let mut uow = self.store.begin().await?;
        let page = db::list::<Establishment>(uow.as_mut(), &query).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for establishment in page.items {
            items.push(view(uow.as_mut(), establishment).await?);
        }
        Ok(params.listing(items, page.total))
    }
}
