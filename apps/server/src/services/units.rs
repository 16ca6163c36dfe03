//! Unit ("unity") service

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    projection::{self, EstablishmentLabel, ListParams, Listing},
    uniqueness, upsert,
};
use crate::{
    config::PaginationConfig,
    db::{self, Predicate, RecordQuery, Store, UnitOfWork},
    models::{AddressFields, Establishment, Unit, UnitInput},
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
#[serde(rename_all = "camelCase")]
pub struct UnitView {
    #[serde(flatten)]
    pub unit: Unit,
    #[serde(flatten)]
    pub address: AddressFields,
    pub unity_establishment_name: Option<String>,
    pub unity_establishment_abbreviation: Option<String>,
}

async fn view(uow: &mut dyn UnitOfWork, unit: Unit) -> Result<UnitView> {
    let address = projection::address_fields(uow, unit.unity_address).await?;
    let EstablishmentLabel { name, abbreviation } =
        projection::establishment_label(uow, Some(unit.unity_establishment)).await?;
    Ok(UnitView {
        unit,
        address,
        unity_establishment_name: name,
        unity_establishment_abbreviation: abbreviation,
    })
}

pub struct UnitService {
    store: Arc<dyn Store>,
    pagination: PaginationConfig,
}

impl UnitService {
    pub fn new(store: Arc<dyn Store>, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    pub async fn create(&self, input: UnitInput) -> Result<UnitView> {
        let mut uow = self.store.begin().await?;
        let (unit, address) = input.into_unit(Uuid::new_v4(), None);
        uniqueness::ensure_unique(uow.as_mut(), &unit, None).await?;
        db::require_reference::<Establishment>(
            uow.as_mut(),
            unit.unity_establishment,
            "unityEstablishment",
        )
        .await?;
        let unit = upsert::insert_with_address(uow.as_mut(), unit, &address).await?;
        let created = view(uow.as_mut(), unit).await?;
        uow.commit().await?;

        tracing::info!(
            unit_id = %created.unit.id,
            establishment_id = %created.unit.unity_establishment,
            "unit created"
        );
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, input: UnitInput) -> Result<UnitView> {
        let mut uow = self.store.begin().await?;
        let previous = db::require::<Unit>(uow.as_mut(), id).await?;
        let (next, address) = input.into_unit(id, previous.unity_address);
        uniqueness::ensure_unique(uow.as_mut(), &next, Some(&previous)).await?;
        if next.unity_establishment != previous.unity_establishment {
            db::require_reference::<Establishment>(
                uow.as_mut(),
                next.unity_establishment,
                "unityEstablishment",
            )
            .await?;
        }
        let stored = upsert::rewrite_with_address(uow.as_mut(), &previous, next, &address).await?;
        let updated = view(uow.as_mut(), stored).await?;
        uow.commit().await?;

        tracing::info!(unit_id = %id, "unit updated");
        Ok(updated)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<()> {
        upsert::deactivate::<Unit>(self.store.as_ref(), id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<UnitView> {
        let mut uow = self.store.begin().await?;
        let unit = db::require::<Unit>(uow.as_mut(), id).await?;
        view(uow.as_mut(), unit).await
    }

    pub async fn list(&self, params: &ListParams) -> Result<Listing<UnitView>> {
        let query = RecordQuery::new(
            Predicate::search(SEARCH_FIELDS, params.search())
                .into_iter()
                .collect(),
        );
        self.list_where(query, params).await
    }

    /// Units belonging to one establishment. The establishment must exist.
    pub async fn list_for_establishment(
        &self,
        establishment_id: Uuid,
        params: &ListParams,
    ) -> Result<Listing<UnitView>> {
        {
            let mut uow = self.store.begin().await?;
            db::require::<Establishment>(uow.as_mut(), establishment_id).await?;
        }

        let mut predicates = vec![Predicate::eq("unityEstablishment", establishment_id)];
        predicates.extend(Predicate::search(SEARCH_FIELDS, params.search()));
        self.list_where(RecordQuery::new(predicates), params).await
    }

    async fn list_where(
        &self,
        mut query: RecordQuery,
        params: &ListParams,
    ) -> Result<Listing<UnitView>> {
        params.window(&self.pagination, &mut query)?;

        let mut uow = self.store.begin().await?;
        let page = db::list::<Unit>(uow.as_mut(), &query).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for unit in page.items {
            items.push(view(uow.as_mut(), unit).await?);
        }
        Ok(params.listing(items, page.total))
    }
}
