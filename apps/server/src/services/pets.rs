//! Pet service. Pets are registered through their tutor (see customers).

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    projection::{self, EstablishmentLabel, ListParams, Listing},
    upsert,
};
use crate::{
    config::PaginationConfig,
    db::{self, Predicate, RecordQuery, Store, UnitOfWork},
    models::{Customer, Pet},
    Result,
};

const SEARCH_FIELDS: &[&str] = &["petName", "specie", "breed", "age"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetView {
    #[serde(flatten)]
    pub pet: Pet,
    pub customer_owner_name: Option<String>,
    pub establishment_registered_name: Option<String>,
    pub establishment_registered_abbreviation: Option<String>,
}

async fn view(uow: &mut dyn UnitOfWork, pet: Pet) -> Result<PetView> {
    let owner = db::get::<Customer>(uow, pet.customer_owner).await?;
    let EstablishmentLabel { name, abbreviation } =
        projection::establishment_label(uow, Some(pet.establishment_registered)).await?;
    Ok(PetView {
        pet,
        customer_owner_name: owner.map(|c| c.name),
        establishment_registered_name: name,
        establishment_registered_abbreviation: abbreviation,
    })
}

#[derive(Debug, Clone, Default)]
pub struct PetFilter {
    pub owner_id: Option<Uuid>,
    pub from_establishment: Option<Uuid>,
}

pub struct PetService {
    store: Arc<dyn Store>,
    pagination: PaginationConfig,
}

impl PetService {
    pub fn new(store: Arc<dyn Store>, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<()> {
        upsert::deactivate::<Pet>(self.store.as_ref(), id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<PetView> {
        let mut uow = self.store.begin().await?;
        let pet = db::require::<Pet>(uow.as_mut(), id).await?;
        view(uow.as_mut(), pet).await
    }

    pub async fn list(&self, filter: &PetFilter, params: &ListParams) -> Result<Listing<PetView>> {
        let mut predicates = Vec::new();
        if let Some(owner) = filter.owner_id {
            predicates.push(Predicate::eq("customerOwner", owner));
        }
        if let Some(establishment) = filter.from_establishment {
            predicates.push(Predicate::eq("establishmentRegistered", establishment));
        }
        predicates.extend(Predicate::search(SEARCH_FIELDS, params.search()));
        let mut query = RecordQuery::new(predicates);
        params.window(&self.pagination, &mut query)?;

        let mut uow = self.store.begin().await?;
        let page = db::list::<Pet>(uow.as_mut(), &query).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for pet in page.items {
            items.push(view(uow.as_mut(), pet).await?);
        }
        Ok(params.listing(items, page.total))
    }
}
