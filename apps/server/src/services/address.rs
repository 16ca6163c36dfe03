//! Address reconciliation for address-owning entities

use uuid::Uuid;

use crate::{
    db::{self, UnitOfWork},
    models::{Address, AddressFields},
    Error, Result,
};

/// What happened to the owner's address reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressOutcome {
    /// Nothing was written. Carries the reference the owner should keep.
    Unchanged(Option<Uuid>),
    /// A new row was inserted; the owner must point at it.
    Created(Uuid),
    /// The referenced row was rewritten in place.
    Updated(Uuid),
}

impl AddressOutcome {
    /// Reference the owner should hold after reconciliation.
    pub fn address_id(self) -> Option<Uuid> {
        match self {
            Self::Unchanged(id) => id,
            Self::Created(id) | Self::Updated(id) => Some(id),
        }
    }
}

fn write_failed(err: Error) -> Error {
    tracing::error!(error = %err, "address write failed");
    Error::Dependency("address update failed".to_string())
}

/// Bring the address referenced by `current` in line with `incoming`.
///
/// Without a reference, a non-empty input creates a new row. With one, the
/// input is merged over the stored row (blank fields keep their value) and
/// the row is rewritten only if some field changed. A reference to a missing
/// row is treated like no reference at all.
pub async fn reconcile(
    uow: &mut dyn UnitOfWork,
    current: Option<Uuid>,
    incoming: &AddressFields,
) -> Result<AddressOutcome> {
    let stored = match current {
        Some(id) => {
            let found = db::get::<Address>(uow, id).await?;
            if found.is_none() {
                tracing::warn!(address_id = %id, "owner references a missing address");
            }
            found
        }
        None => None,
    };

    let Some(stored) = stored else {
        if incoming.is_empty() {
            return Ok(AddressOutcome::Unchanged(None));
        }
        let address = Address {
            id: Uuid::new_v4(),
            fields: incoming.clone(),
        };
        db::insert(uow, &address).await.map_err(write_failed)?;
        return Ok(AddressOutcome::Created(address.id));
    };

    let merged = incoming.merged_over(&stored.fields);
    if merged == stored.fields {
        return Ok(AddressOutcome::Unchanged(Some(stored.id)));
    }

    let updated = Address {
        id: stored.id,
        fields: merged,
    };
    db::replace(uow, &updated).await.map_err(write_failed)?;
    Ok(AddressOutcome::Updated(updated.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, Store};

    fn street(name: &str) -> AddressFields {
        AddressFields {
            street: Some(name.to_string()),
            city: Some("Recife".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_input_without_reference_is_a_no_op() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let outcome = reconcile(uow.as_mut(), None, &AddressFields::default())
            .await
            .unwrap();
        assert_eq!(outcome, AddressOutcome::Unchanged(None));
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();

        let created = reconcile(uow.as_mut(), None, &street("Main St"))
            .await
            .unwrap();
        let AddressOutcome::Created(id) = created else {
            panic!("expected a new address, got {created:?}");
        };

        let again = reconcile(uow.as_mut(), Some(id), &street("Main St"))
            .await
            .unwrap();
        assert_eq!(again, AddressOutcome::Unchanged(Some(id)));
    }

    #[tokio::test]
    async fn changed_field_updates_in_place() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let id = reconcile(uow.as_mut(), None, &street("Main St"))
            .await
            .unwrap()
            .address_id()
            .unwrap();

        let incoming = AddressFields {
            city: Some("Olinda".to_string()),
            ..Default::default()
        };
        let outcome = reconcile(uow.as_mut(), Some(id), &incoming).await.unwrap();
        assert_eq!(outcome, AddressOutcome::Updated(id));

        let stored = db::require::<Address>(uow.as_mut(), id).await.unwrap();
        assert_eq!(stored.fields.street.as_deref(), Some("Main St"));
        assert_eq!(stored.fields.city.as_deref(), Some("Olinda"));
    }

    #[tokio::test]
    async fn dangling_reference_gets_a_fresh_address() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let missing = Uuid::new_v4();

        let outcome = reconcile(uow.as_mut(), Some(missing), &street("Main St"))
            .await
            .unwrap();
        match outcome {
            AddressOutcome::Created(id) => assert_ne!(id, missing),
            other => panic!("expected a new address, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_string_clears_a_stored_field() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let mut fields = street("Main St");
        fields.compliment = Some("Apt 2".to_string());
        let id = reconcile(uow.as_mut(), None, &fields)
            .await
            .unwrap()
            .address_id()
            .unwrap();

        let incoming = AddressFields {
            compliment: Some(String::new()),
            ..Default::default()
        };
        let outcome = reconcile(uow.as_mut(), Some(id), &incoming).await.unwrap();
        assert_eq!(outcome, AddressOutcome::Updated(id));

        let stored = db::require::<Address>(uow.as_mut(), id).await.unwrap();
        assert_eq!(stored.fields.compliment.as_deref(), Some(""));
        assert_eq!(stored.fields.street.as_deref(), Some("Main St"));
    }
}
