//! Response shaping: pagination windows, listing envelopes and reference
//! labels resolved by point lookups.

use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::PaginationConfig,
    db::{self, RecordQuery, UnitOfWork},
    models::{Address, AddressFields, Establishment},
    Error, Result,
};

/// Paging and search parameters common to every list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// 1-based page. Absent means "everything, unwrapped".
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

impl ListParams {
    /// Apply the window to `query` after checking the bounds.
    pub fn window(&self, config: &PaginationConfig, query: &mut RecordQuery) -> Result<()> {
        let page_size = self.page_size.unwrap_or(config.default_page_size);
        if page_size == 0 || page_size > config.max_page_size {
            return Err(Error::Validation(format!(
                "pageSize must be between 1 and {}",
                config.max_page_size
            )));
        }

        match self.page {
            None => {
                query.offset = None;
                query.limit = None;
            }
            Some(0) => return Err(Error::Validation("page must be at least 1".to_string())),
            Some(page) => {
                query.offset = Some(u64::from(page - 1) * u64::from(page_size));
                query.limit = Some(u64::from(page_size));
            }
        }
        Ok(())
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn listing<T>(&self, items: Vec<T>, total: u64) -> Listing<T> {
        if self.page.is_some() {
            Listing::Page {
                data: items,
                total_count: total,
            }
        } else {
            Listing::All(items)
        }
    }
}

/// A bare array when no page was requested, `{data, totalCount}` otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Listing<T> {
    All(Vec<T>),
    Page {
        data: Vec<T>,
        #[serde(rename = "totalCount")]
        total_count: u64,
    },
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Self::All(items) => items,
            Self::Page { data, .. } => data,
        }
    }
}

/// Address fields for a reference, blank when there is none.
pub async fn address_fields(
    uow: &mut dyn UnitOfWork,
    address_id: Option<Uuid>,
) -> Result<AddressFields> {
    let Some(id) = address_id else {
        return Ok(AddressFields::default());
    };
    Ok(db::get::<Address>(uow, id)
        .await?
        .map(|a| a.fields)
        .unwrap_or_default())
}

/// Name and abbreviation of a referenced establishment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EstablishmentLabel {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
}

pub async fn establishment_label(
    uow: &mut dyn UnitOfWork,
    id: Option<Uuid>,
) -> Result<EstablishmentLabel> {
    let Some(id) = id else {
        return Ok(EstablishmentLabel::default());
    };
    Ok(db::get::<Establishment>(uow, id)
        .await?
        .map(|e| EstablishmentLabel {
            name: Some(e.name),
            abbreviation: Some(e.abbreviation),
        })
        .unwrap_or_default())
}
