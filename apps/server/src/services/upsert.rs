//! Create/update/deactivate sequencing shared by every entity service.
//!
//! The helpers run inside a caller-owned unit of work; the caller commits
//! once its own relation rows are written.

use uuid::Uuid;

use super::{address, uniqueness};
use crate::{
    db::{self, Store, UnitOfWork},
    models::{AddressFields, AddressOwner, Entity, Lifecycle, Status},
    Error, Result,
};

fn ensure_transition(from: Status, to: Status) -> Result<()> {
    if from.can_become(to) {
        Ok(())
    } else {
        Err(Error::conflict(
            "status",
            "A deactivated record cannot be reactivated",
        ))
    }
}

/// Uniqueness, then insert.
pub async fn create<E: Entity>(uow: &mut dyn UnitOfWork, entity: &E) -> Result<()> {
    uniqueness::ensure_unique(uow, entity, None).await?;
    db::insert(uow, entity).await
}

/// Uniqueness, address, then insert with the address already linked.
pub async fn create_with_address<E: AddressOwner>(
    uow: &mut dyn UnitOfWork,
    entity: E,
    incoming: &AddressFields,
) -> Result<E> {
    uniqueness::ensure_unique(uow, &entity, None).await?;
    insert_with_address(uow, entity, incoming).await
}

/// Address, then insert. For callers that already ran uniqueness and their
/// parent checks.
pub async fn insert_with_address<E: AddressOwner>(
    uow: &mut dyn UnitOfWork,
    mut entity: E,
    incoming: &AddressFields,
) -> Result<E> {
    let outcome = address::reconcile(uow, None, incoming).await?;
    entity.set_address_id(outcome.address_id());
    db::insert(uow, &entity).await?;
    Ok(entity)
}

/// Status transition, then a write only if the document changed. Uniqueness
/// is the caller's, run before its parent checks. Returns the record as stored.
pub async fn rewrite<E: Lifecycle + PartialEq>(
    uow: &mut dyn UnitOfWork,
    previous: &E,
    next: E,
) -> Result<E> {
    ensure_transition(previous.status(), next.status())?;
    if next != *previous {
        db::replace(uow, &next).await?;
    }
    Ok(next)
}

/// Uniqueness against the stored values, then [`rewrite_with_address`].
pub async fn update_with_address<E: Lifecycle + AddressOwner + PartialEq>(
    uow: &mut dyn UnitOfWork,
    previous: &E,
    next: E,
    incoming: &AddressFields,
) -> Result<E> {
    uniqueness::ensure_unique(uow, &next, Some(previous)).await?;
    rewrite_with_address(uow, previous, next, incoming).await
}

/// Like [`rewrite`], reconciling the owner's address before the owner write.
pub async fn rewrite_with_address<E: Lifecycle + AddressOwner + PartialEq>(
    uow: &mut dyn UnitOfWork,
    previous: &E,
    mut next: E,
    incoming: &AddressFields,
) -> Result<E> {
    ensure_transition(previous.status(), next.status())?;

    let outcome = address::reconcile(uow, previous.address_id(), incoming).await?;
    next.set_address_id(outcome.address_id());

    if next != *previous {
        db::replace(uow, &next).await?;
    }
    Ok(next)
}

/// Set DEACTIVATED in its own unit of work. Deactivating twice is fine.
pub async fn deactivate<E: Lifecycle>(store: &dyn Store, id: Uuid) -> Result<()> {
    let mut uow = store.begin().await?;
    let mut entity = db::require::<E>(uow.as_mut(), id).await?;
    if entity.status() != Status::Deactivated {
        entity.set_status(Status::Deactivated);
        db::replace(uow.as_mut(), &entity).await?;
    }
    uow.commit().await?;

    tracing::info!(kind = E::KIND.as_str(), id = %id, "record deactivated");
    Ok(())
}
