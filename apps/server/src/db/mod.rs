//! Database layer
//!
//! Records are JSON documents keyed by `(kind, id)`. A [`Store`] hands out
//! [`UnitOfWork`]s; everything written through one becomes visible only when
//! it is committed, and dropping it discards the writes.

mod memory;
mod postgres;
mod query;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use query::{Page, Predicate, RecordQuery};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    models::{Entity, EntityKind},
    Error, Result,
};

#[async_trait]
pub trait Store: Send + Sync {
    /// Start a unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;

    /// Cheap connectivity check used by `/health`.
    async fn health_check(&self) -> Result<()>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    async fn fetch(&mut self, kind: EntityKind, id: Uuid) -> Result<Option<JsonValue>>;

    /// Insert a new record. Violating a unique index yields `Error::Conflict`.
    async fn insert(&mut self, kind: EntityKind, id: Uuid, document: JsonValue) -> Result<()>;

    /// Replace an existing record. Returns false when no record matched.
    async fn replace(&mut self, kind: EntityKind, id: Uuid, document: JsonValue) -> Result<bool>;

    /// Delete every record of `kind` matching all predicates.
    async fn delete_where(&mut self, kind: EntityKind, predicates: &[Predicate]) -> Result<u64>;

    /// Ids of records of `kind` matching all predicates, in insertion order.
    async fn find_ids(&mut self, kind: EntityKind, predicates: &[Predicate]) -> Result<Vec<Uuid>>;

    async fn query(&mut self, kind: EntityKind, query: &RecordQuery) -> Result<Page<JsonValue>>;

    async fn fetch_attachment(&mut self, kind: EntityKind, id: Uuid) -> Result<Option<Vec<u8>>>;

    /// Store binary content beside a record. Returns false when no record
    /// matched.
    async fn store_attachment(&mut self, kind: EntityKind, id: Uuid, content: &[u8])
        -> Result<bool>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

fn decode<E: Entity>(document: JsonValue) -> Result<E> {
    serde_json::from_value(document).map_err(|e| {
        Error::Internal(format!("stored {} is malformed: {e}", E::KIND.as_str()))
    })
}

fn encode<E: Entity>(entity: &E) -> Result<JsonValue> {
    serde_json::to_value(entity)
        .map_err(|e| Error::Internal(format!("failed to encode {}: {e}", E::KIND.as_str())))
}

pub async fn get<E: Entity>(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Option<E>> {
    uow.fetch(E::KIND, id).await?.map(decode).transpose()
}

/// Load a record or fail with `NotFound` ("<Label> not found").
pub async fn require<E: Entity>(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<E> {
    get(uow, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} not found", E::KIND.label())))
}

/// Load a referenced parent or fail with `Conflict` on `field`.
pub async fn require_reference<E: Entity>(
    uow: &mut dyn UnitOfWork,
    id: Uuid,
    field: &str,
) -> Result<E> {
    get(uow, id).await?.ok_or_else(|| {
        Error::conflict(
            field,
            format!("{} to register does not exist", E::KIND.label()),
        )
    })
}

pub async fn insert<E: Entity>(uow: &mut dyn UnitOfWork, entity: &E) -> Result<()> {
    uow.insert(E::KIND, entity.id(), encode(entity)?).await
}

pub async fn replace<E: Entity>(uow: &mut dyn UnitOfWork, entity: &E) -> Result<()> {
    if uow.replace(E::KIND, entity.id(), encode(entity)?).await? {
        Ok(())
    } else {
        Err(Error::NotFound(format!("{} not found", E::KIND.label())))
    }
}

pub async fn list<E: Entity>(uow: &mut dyn UnitOfWork, query: &RecordQuery) -> Result<Page<E>> {
    let page = uow.query(E::KIND, query).await?;
    let items = page
        .items
        .into_iter()
        .map(decode)
        .collect::<Result<Vec<E>>>()?;
    Ok(Page {
        items,
        total: page.total,
    })
}
