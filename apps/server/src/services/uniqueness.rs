//! Uniqueness validation
//!
//! Runs before any write so clients get a conflict naming the offending
//! field. The unique indexes in the store remain the final guard against
//! concurrent writers.

use serde_json::Value as JsonValue;

use crate::{
    db::{Predicate, UnitOfWork},
    models::{Entity, UniqueScope},
    Error, Result,
};

fn document<E: Entity>(entity: &E) -> Result<JsonValue> {
    serde_json::to_value(entity)
        .map_err(|e| Error::Internal(format!("failed to encode {}: {e}", E::KIND.as_str())))
}

fn text<'a>(document: &'a JsonValue, field: &str) -> Option<&'a str> {
    document
        .get(field)
        .and_then(JsonValue::as_str)
        .filter(|v| !v.is_empty())
}

/// Unique fields of `candidate` already taken by another record in the same
/// scope, in priority order.
///
/// With `previous` set (an update), a field whose value did not change is
/// never reported, and the record itself never counts as a match.
pub async fn violations<E: Entity>(
    uow: &mut dyn UnitOfWork,
    candidate: &E,
    previous: Option<&E>,
) -> Result<Vec<&'static str>> {
    let kind = E::KIND;
    let candidate_doc = document(candidate)?;
    let previous_doc = previous.map(document).transpose()?;

    let scope = match kind.unique_scope() {
        UniqueScope::Global => None,
        UniqueScope::Field(field) => Some(Predicate::eq_or_null(
            field,
            candidate_doc.get(field).filter(|v| !v.is_null()),
        )),
    };

    let mut violated = Vec::new();
    for &field in kind.unique_fields() {
        let Some(value) = text(&candidate_doc, field) else {
            continue;
        };
        if let Some(previous_doc) = &previous_doc {
            if text(previous_doc, field) == Some(value) {
                continue;
            }
        }

        let mut predicates = vec![Predicate::eq(field, value)];
        predicates.extend(scope.clone());
        let matches = uow.find_ids(kind, &predicates).await?;
        if matches.iter().any(|id| *id != candidate.id()) {
            violated.push(field);
        }
    }

    Ok(violated)
}

/// Fails with a conflict on the first violated field.
pub async fn ensure_unique<E: Entity>(
    uow: &mut dyn UnitOfWork,
    candidate: &E,
    previous: Option<&E>,
) -> Result<()> {
    match violations(uow, candidate, previous).await?.first() {
        Some(field) => {
            tracing::debug!(
                kind = E::KIND.as_str(),
                id = %candidate.id(),
                field,
                "uniqueness violation"
            );
            Err(Error::conflict(
                *field,
                format!("{} with same {field} already exists", E::KIND.label()),
            ))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, MemoryStore, Store};
    use crate::models::{Customer, Medicine, MedicineUse, PharmaceuticalForm, Status};
    use uuid::Uuid;

    fn customer(name: &str, cpf: Option<&str>, tenant: Uuid) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            cpf: cpf.map(str::to_string),
            other_document: None,
            email: None,
            cns: None,
            birth_date: None,
            main_phone: None,
            secondary_phone: None,
            is_patient: true,
            is_responsible: false,
            is_tutor: false,
            status: Status::Active,
            customer_establishment: tenant,
            customer_address: None,
        }
    }

    fn medicine(name: &str, tenant: Option<Uuid>) -> Medicine {
        Medicine {
            id: Uuid::new_v4(),
            name: name.to_string(),
            pharmaceutical_form: PharmaceuticalForm::Comprimido,
            regulatory_category: None,
            active_ingredient: None,
            for_use: MedicineUse::Human,
            status: Status::Active,
            establishment_registered: tenant,
        }
    }

    #[tokio::test]
    async fn reports_every_violated_field_in_priority_order() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let mut uow = store.begin().await.unwrap();
        db::insert(uow.as_mut(), &customer("Ana", Some("123"), tenant))
            .await
            .unwrap();

        let candidate = customer("Ana", Some("123"), tenant);
        let fields = violations(uow.as_mut(), &candidate, None).await.unwrap();
        assert_eq!(fields, vec!["name", "cpf"]);

        let elsewhere = customer("Ana", Some("123"), Uuid::new_v4());
        assert!(violations(uow.as_mut(), &elsewhere, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn update_never_conflicts_with_itself() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let mut uow = store.begin().await.unwrap();
        let stored = customer("Ana", Some("123"), tenant);
        db::insert(uow.as_mut(), &stored).await.unwrap();

        let mut edited = stored.clone();
        edited.main_phone = Some("555".into());
        ensure_unique(uow.as_mut(), &edited, Some(&stored))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn blank_values_are_not_checked() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let mut uow = store.begin().await.unwrap();
        db::insert(uow.as_mut(), &customer("Ana", Some(""), tenant))
            .await
            .unwrap();

        let candidate = customer("Bia", Some(""), tenant);
        ensure_unique(uow.as_mut(), &candidate, None).await.unwrap();
    }

    #[tokio::test]
    async fn shared_catalog_is_its_own_scope() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let mut uow = store.begin().await.unwrap();
        db::insert(uow.as_mut(), &medicine("Dipirona", None))
            .await
            .unwrap();

        ensure_unique(uow.as_mut(), &medicine("Dipirona", Some(tenant)), None)
            .await
            .unwrap();
        let err = ensure_unique(uow.as_mut(), &medicine("Dipirona", None), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Medicine with same name already exists");
    }
}
