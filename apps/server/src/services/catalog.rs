//! Tenant-extensible catalogs: medicines, establishment types and regional
//! document types.
//!
//! Entries without `establishmentRegistered` are shared defaults; entries
//! with it belong to that establishment. The `availableFor` list filter
//! decides which of the two groups a caller sees.

use serde::Serialize;
use std::{marker::PhantomData, sync::Arc};
use uuid::Uuid;

use super::{
    projection::{self, EstablishmentLabel, ListParams, Listing},
    uniqueness, upsert,
};
use crate::{
    config::PaginationConfig,
    db::{self, Predicate, RecordQuery, Store, UnitOfWork},
    models::{Establishment, EstablishmentType, Lifecycle, Medicine, RegionalDocumentType},
    Error, Result,
};

const REGISTERED_BY: &str = "establishmentRegistered";

/// Shared defaults plus the entries of `establishment`.
fn visible_to(establishment: Uuid) -> Predicate {
    Predicate::Any(vec![
        Predicate::IsNull(REGISTERED_BY),
        Predicate::eq(REGISTERED_BY, establishment),
    ])
}

/// A catalog entry optionally owned by one establishment.
pub trait CatalogEntry: Lifecycle + PartialEq {
    const SEARCH_FIELDS: &'static [&'static str];

    fn establishment_registered(&self) -> Option<Uuid>;

    /// Predicates for an `availableFor` value as seen from `establishment`.
    fn availability(available_for: Option<&str>, establishment: Uuid) -> Result<Vec<Predicate>>;
}

impl CatalogEntry for Medicine {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "activeIngredient"];

    fn establishment_registered(&self) -> Option<Uuid> {
        self.establishment_registered
    }

    /// `establishment`: defaults and own entries. `all` or nothing: every
    /// entry. Anything else: defaults only.
    fn availability(available_for: Option<&str>, establishment: Uuid) -> Result<Vec<Predicate>> {
        Ok(match available_for {
            None | Some("all") => Vec::new(),
            Some("establishment") => vec![visible_to(establishment)],
            Some(_) => vec![Predicate::IsNull(REGISTERED_BY)],
        })
    }
}

impl CatalogEntry for EstablishmentType {
    const SEARCH_FIELDS: &'static [&'static str] = &["name"];

    fn establishment_registered(&self) -> Option<Uuid> {
        self.establishment_registered
    }

    /// Types meant for establishments exclude UNITY-only types and the
    /// other way round.
    fn availability(available_for: Option<&str>, establishment: Uuid) -> Result<Vec<Predicate>> {
        let excluded = match available_for {
            None => return Ok(Vec::new()),
            Some("establishment") => "UNITY",
            Some("unity") => "ESTABLISHMENT",
            Some(other) => {
                return Err(Error::Validation(format!(
                    "availableFor must be establishment or unity (got '{other}')"
                )))
            }
        };
        Ok(vec![
            Predicate::not_eq("availableFor", excluded),
            visible_to(establishment),
        ])
    }
}

impl CatalogEntry for RegionalDocumentType {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "abbreviation"];

    fn establishment_registered(&self) -> Option<Uuid> {
        self.establishment_registered
    }

    fn availability(available_for: Option<&str>, establishment: Uuid) -> Result<Vec<Predicate>> {
        Ok(match available_for {
            Some("establishment") => vec![visible_to(establishment)],
            _ => Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView<E> {
    #[serde(flatten)]
    pub entry: E,
    pub establishment_registered_name: Option<String>,
    pub establishment_registered_abbreviation: Option<String>,
}

async fn view<E: CatalogEntry>(uow: &mut dyn UnitOfWork, entry: E) -> Result<CatalogView<E>> {
    let EstablishmentLabel { name, abbreviation } =
        projection::establishment_label(uow, entry.establishment_registered()).await?;
    Ok(CatalogView {
        entry,
        establishment_registered_name: name,
        establishment_registered_abbreviation: abbreviation,
    })
}

pub struct CatalogService<E> {
    store: Arc<dyn Store>,
    pagination: PaginationConfig,
    _entry: PhantomData<fn() -> E>,
}

pub type MedicineService = CatalogService<Medicine>;
pub type EstablishmentTypeService = CatalogService<EstablishmentType>;
pub type RegionalDocumentTypeService = CatalogService<RegionalDocumentType>;

impl<E: CatalogEntry> CatalogService<E> {
    pub fn new(store: Arc<dyn Store>, pagination: PaginationConfig) -> Self {
        Self {
            store,
            pagination,
            _entry: PhantomData,
        }
    }

    async fn check_owner(uow: &mut dyn UnitOfWork, entry: &E) -> Result<()> {
        if let Some(establishment) = entry.establishment_registered() {
            db::require_reference::<Establishment>(uow, establishment, REGISTERED_BY).await?;
        }
        Ok(())
    }

    pub async fn create(&self, entry: E) -> Result<CatalogView<E>> {
        let mut uow = self.store.begin().await?;
        uniqueness::ensure_unique(uow.as_mut(), &entry, None).await?;
        Self::check_owner(uow.as_mut(), &entry).await?;
        db::insert(uow.as_mut(), &entry).await?;
        let created = view(uow.as_mut(), entry).await?;
        uow.commit().await?;

        tracing::info!(
            kind = E::KIND.as_str(),
            id = %created.entry.id(),
            "catalog entry created"
        );
        Ok(created)
    }

    /// `next` must carry the id being updated.
    pub async fn update(&self, next: E) -> Result<CatalogView<E>> {
        let mut uow = self.store.begin().await?;
        let previous = db::require::<E>(uow.as_mut(), next.id()).await?;
        uniqueness::ensure_unique(uow.as_mut(), &next, Some(&previous)).await?;
        if next.establishment_registered() != previous.establishment_registered() {
            Self::check_owner(uow.as_mut(), &next).await?;
        }
        let stored = upsert::rewrite(uow.as_mut(), &previous, next).await?;
        let updated = view(uow.as_mut(), stored).await?;
        uow.commit().await?;

        tracing::info!(
            kind = E::KIND.as_str(),
            id = %updated.entry.id(),
            "catalog entry updated"
        );
        Ok(updated)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<()> {
        upsert::deactivate::<E>(self.store.as_ref(), id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<CatalogView<E>> {
        let mut uow = self.store.begin().await?;
        let entry = db::require::<E>(uow.as_mut(), id).await?;
        view(uow.as_mut(), entry).await
    }

    /// `establishment` is the caller's own establishment.
    pub async fn list(
        &self,
        available_for: Option<&str>,
        establishment: Uuid,
        params: &ListParams,
    ) -> Result<Listing<CatalogView<E>>> {
        let available_for = available_for.map(str::to_ascii_lowercase);
        let mut predicates = E::availability(available_for.as_deref(), establishment)?;
        predicates.extend(Predicate::search(E::SEARCH_FIELDS, params.search()));
        let mut query = RecordQuery::new(predicates);
        params.window(&self.pagination, &mut query)?;

        let mut uow = self.store.begin().await?;
        let page = db::list::<E>(uow.as_mut(), &query).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for entry in page.items {
            items.push(view(uow.as_mut(), entry).await?);
        }
        Ok(params.listing(items, page.total))
    }
}
