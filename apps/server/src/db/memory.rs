//! In-process store
//!
//! Backs the test suite and `database.url = "memory"`. A unit of work holds
//! the table lock for its whole lifetime and edits a private snapshot, which
//! replaces the shared tables on commit. Unique fields are enforced the same
//! way the Postgres indexes enforce them.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Page, Predicate, RecordQuery, Store, UnitOfWork};
use crate::{
    models::{EntityKind, UniqueScope},
    Error, Result,
};

#[derive(Debug, Clone)]
struct StoredRecord {
    seq: u64,
    document: JsonValue,
    attachment: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    records: BTreeMap<(EntityKind, Uuid), StoredRecord>,
    next_seq: u64,
}

impl Tables {
    fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = (&Uuid, &StoredRecord)> {
        self.records
            .range((kind, Uuid::nil())..=(kind, Uuid::from_u128(u128::MAX)))
            .map(|((_, id), record)| (id, record))
    }

    /// Matching records in insertion order.
    fn matching(&self, kind: EntityKind, predicates: &[Predicate]) -> Vec<(Uuid, &StoredRecord)> {
        let mut rows: Vec<_> = self
            .of_kind(kind)
            .filter(|(_, r)| predicates.iter().all(|p| p.matches(&r.document)))
            .map(|(id, r)| (*id, r))
            .collect();
        rows.sort_by_key(|(_, r)| r.seq);
        rows
    }

    fn check_unique(&self, kind: EntityKind, id: Uuid, document: &JsonValue) -> Result<()> {
        let scope = match kind.unique_scope() {
            UniqueScope::Global => None,
            UniqueScope::Field(field) => Some(Predicate::eq_or_null(
                field,
                document.get(field).filter(|v| !v.is_null()),
            )),
        };

        for field in kind.unique_fields() {
            let value = match document.get(*field).and_then(JsonValue::as_str) {
                Some(v) if !v.is_empty() => v,
                _ => continue,
            };
            let mut predicates = vec![Predicate::eq(*field, value)];
            predicates.extend(scope.clone());

            let taken = self
                .matching(kind, &predicates)
                .iter()
                .any(|(other, _)| *other != id);
            if taken {
                return Err(Error::conflict(
                    *field,
                    format!("{} with same {field} already exists", kind.label()),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn fetch(&mut self, kind: EntityKind, id: Uuid) -> Result<Option<JsonValue>> {
        Ok(self
            .working
            .records
            .get(&(kind, id))
            .map(|r| r.document.clone()))
    }

    async fn insert(&mut self, kind: EntityKind, id: Uuid, document: JsonValue) -> Result<()> {
        if self.working.records.contains_key(&(kind, id)) {
            return Err(Error::conflict(
                "id",
                format!("{} with same id already exists", kind.label()),
            ));
        }
        self.working.check_unique(kind, id, &document)?;

        let seq = self.working.next_seq;
        self.working.next_seq += 1;
        self.working.records.insert(
            (kind, id),
            StoredRecord {
                seq,
                document,
                attachment: None,
            },
        );
        Ok(())
    }

    async fn replace(&mut self, kind: EntityKind, id: Uuid, document: JsonValue) -> Result<bool> {
        if !self.working.records.contains_key(&(kind, id)) {
            return Ok(false);
        }
        self.working.check_unique(kind, id, &document)?;
        if let Some(record) = self.working.records.get_mut(&(kind, id)) {
            record.document = document;
        }
        Ok(true)
    }

    async fn delete_where(&mut self, kind: EntityKind, predicates: &[Predicate]) -> Result<u64> {
        let ids: Vec<Uuid> = self
            .working
            .matching(kind, predicates)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        for id in &ids {
            self.working.records.remove(&(kind, *id));
        }
        Ok(ids.len() as u64)
    }

    async fn find_ids(&mut self, kind: EntityKind, predicates: &[Predicate]) -> Result<Vec<Uuid>> {
        Ok(self
            .working
            .matching(kind, predicates)
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    async fn query(&mut self, kind: EntityKind, query: &RecordQuery) -> Result<Page<JsonValue>> {
        let rows = self.working.matching(kind, &query.predicates);
        let total = rows.len() as u64;
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        let items = rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, r)| r.document.clone())
            .collect();
        Ok(Page { items, total })
    }

    async fn fetch_attachment(&mut self, kind: EntityKind, id: Uuid) -> Result<Option<Vec<u8>>> {
        Ok(self
            .working
            .records
            .get(&(kind, id))
            .and_then(|r| r.attachment.clone()))
    }

    async fn store_attachment(
        &mut self,
        kind: EntityKind,
        id: Uuid,
        content: &[u8],
    ) -> Result<bool> {
        match self.working.records.get_mut(&(kind, id)) {
            Some(record) => {
                record.attachment = Some(content.to_vec());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn dropped_unit_of_work_discards_writes() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let mut uow = store.begin().await.unwrap();
        uow.insert(EntityKind::Pet, id, json!({ "id": id, "petName": "Rex" }))
            .await
            .unwrap();
        drop(uow);

        let mut uow = store.begin().await.unwrap();
        assert!(uow.fetch(EntityKind::Pet, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_fields_are_enforced_per_scope() {
        let store = MemoryStore::new();
        let (tenant_a, tenant_b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut uow = store.begin().await.unwrap();

        let customer = |tenant: Uuid| {
            json!({ "name": "Ana", "cpf": "", "customerEstablishment": tenant })
        };
        uow.insert(EntityKind::Customer, Uuid::new_v4(), customer(tenant_a))
            .await
            .unwrap();
        uow.insert(EntityKind::Customer, Uuid::new_v4(), customer(tenant_b))
            .await
            .unwrap();

        let err = uow
            .insert(EntityKind::Customer, Uuid::new_v4(), customer(tenant_a))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { field: Some(ref f), .. } if f == "name"));
    }

    #[tokio::test]
    async fn query_windows_in_insertion_order() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        for n in 0..5 {
            uow.insert(EntityKind::Medicine, Uuid::new_v4(), json!({ "name": format!("m{n}") }))
                .await
                .unwrap();
        }

        let page = uow
            .query(
                EntityKind::Medicine,
                &RecordQuery {
                    predicates: vec![],
                    offset: Some(2),
                    limit: Some(2),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        let names: Vec<_> = page.items.iter().map(|d| d["name"].clone()).collect();
        assert_eq!(names, vec![json!("m2"), json!("m3")]);
    }
}
