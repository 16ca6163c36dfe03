//! Customer service
//!
//! A customer may be a patient, a responsible for other patients and a pet
//! tutor at once. Responsibility links and pets are written in the same unit
//! of work as the customer itself.

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
    models::{
        AddressFields, Customer, CustomerInput, CustomerRelations, EntityKind, Establishment,
        PatientResponsible,
    },
    Error, Result,
};

const SEARCH_FIELDS: &[&str] = &["name", "otherDocument", "cpf", "cns", "email", "mainPhone"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(flatten)]
    pub address: AddressFields,
    pub customer_establishment_name: Option<String>,
    pub customer_establishment_abbreviation: Option<String>,
}

/// Detail view: the list view plus the patients this customer answers for.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub view: CustomerView,
    pub patient_responsible_list: Vec<Uuid>,
}

async fn view(uow: &mut dyn UnitOfWork, customer: Customer) -> Result<CustomerView> {
    let address = projection::address_fields(uow, customer.customer_address).await?;
    let EstablishmentLabel { name, abbreviation } =
        projection::establishment_label(uow, Some(customer.customer_establishment)).await?;
    Ok(CustomerView {
        customer,
        address,
        customer_establishment_name: name,
        customer_establishment_abbreviation: abbreviation,
    })
}

/// Which role a listed customer must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerType {
    Patient,
    Responsible,
    Tutor,
}

impl CustomerType {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "patient" => Ok(Self::Patient),
            "responsible" => Ok(Self::Responsible),
            "tutor" => Ok(Self::Tutor),
            other => Err(Error::Validation(format!(
                "type must be one of patient, responsible, tutor (got '{other}')"
            ))),
        }
    }

    fn flag(self) -> &'static str {
        match self {
            Self::Patient => "isPatient",
            Self::Responsible => "isResponsible",
            Self::Tutor => "isTutor",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub customer_type: Option<CustomerType>,
    pub from_establishment: Option<Uuid>,
}

impl CustomerFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(kind) = self.customer_type {
            predicates.push(Predicate::eq(kind.flag(), true));
        }
        if let Some(establishment) = self.from_establishment {
            predicates.push(Predicate::eq("customerEstablishment", establishment));
        }
        predicates
    }
}

pub struct CustomerService {
    store: Arc<dyn Store>,
    pagination: PaginationConfig,
}

impl CustomerService {
    pub fn new(store: Arc<dyn Store>, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    pub async fn create(&self, input: CustomerInput) -> Result<CustomerDetail> {
        let mut uow = self.store.begin().await?;
        let establishment = input.establishment_bounded;
        let (customer, relations) = input.into_customer(Uuid::new_v4(), establishment, None);
        uniqueness::ensure_unique(uow.as_mut(), &customer, None).await?;
        db::require_reference::<Establishment>(uow.as_mut(), establishment, "establishmentBounded")
            .await?;
        let customer =
            upsert::insert_with_address(uow.as_mut(), customer, &relations.address).await?;
        apply_relations(uow.as_mut(), &customer, relations).await?;

        let created = detail(uow.as_mut(), customer).await?;
        uow.commit().await?;

        tracing::info!(
            customer_id = %created.view.customer.id,
            establishment_id = %establishment,
            "customer created"
        );
        Ok(created)
    }

    /// The customer keeps its original establishment; uniqueness stays scoped
    /// to it.
    pub async fn update(&self, id: Uuid, input: CustomerInput) -> Result<CustomerDetail> {
        let mut uow = self.store.begin().await?;
        let previous = db::require::<Customer>(uow.as_mut(), id).await?;

        let (next, relations) = input.into_customer(
            id,
            previous.customer_establishment,
            previous.customer_address,
        );
        let stored =
            upsert::update_with_address(uow.as_mut(), &previous, next, &relations.address).await?;
        apply_relations(uow.as_mut(), &stored, relations).await?;

        let updated = detail(uow.as_mut(), stored).await?;
        uow.commit().await?;

        tracing::info!(customer_id = %id, "customer updated");
        Ok(updated)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<()> {
        upsert::deactivate::<Customer>(self.store.as_ref(), id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<CustomerDetail> {
        let mut uow = self.store.begin().await?;
        let customer = db::require::<Customer>(uow.as_mut(), id).await?;
        detail(uow.as_mut(), customer).await
    }

    pub async fn list(
        &self,
        filter: &CustomerFilter,
        params: &ListParams,
    ) -> Result<Listing<CustomerView>> {
        let mut predicates = filter.predicates();
        predicates.extend(Predicate::search(SEARCH_FIELDS, params.search()));
        let mut query = RecordQuery::new(predicates);
        params.window(&self.pagination, &mut query)?;

        let mut uow = self.store.begin().await?;
        let page = db::list::<Customer>(uow.as_mut(), &query).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for customer in page.items {
            items.push(view(uow.as_mut(), customer).await?);
        }
        Ok(params.listing(items, page.total))
    }
}

async fn detail(uow: &mut dyn UnitOfWork, customer: Customer) -> Result<CustomerDetail> {
    let patient_responsible_list = patients_of(uow, customer.id).await?;
    Ok(CustomerDetail {
        view: view(uow, customer).await?,
        patient_responsible_list,
    })
}

async fn patients_of(uow: &mut dyn UnitOfWork, responsible_id: Uuid) -> Result<Vec<Uuid>> {
    let links = db::list::<PatientResponsible>(
        uow,
        &RecordQuery::new(vec![Predicate::eq("responsibleId", responsible_id)]),
    )
    .await?;
    Ok(links.items.into_iter().map(|l| l.patient_id).collect())
}

/// Removes then adds responsibility links, then registers pets owned by the
/// customer.
async fn apply_relations(
    uow: &mut dyn UnitOfWork,
    customer: &Customer,
    relations: CustomerRelations,
) -> Result<()> {
    for patient_id in &relations.patients_to_remove {
        let removed = uow
            .delete_where(
                EntityKind::PatientResponsible,
                &[
                    Predicate::eq("responsibleId", customer.id),
                    Predicate::eq("patientId", *patient_id),
                ],
            )
            .await?;
        tracing::debug!(
            responsible_id = %customer.id,
            patient_id = %patient_id,
            removed,
            "responsibility link removed"
        );
    }

    let mut linked = patients_of(uow, customer.id).await?;
    for patient_id in relations.patients_to_add {
        if linked.contains(&patient_id) {
            continue;
        }
        db::require_reference::<Customer>(uow, patient_id, "patientsResponsibleIdList").await?;
        let link = PatientResponsible {
            id: Uuid::new_v4(),
            patient_id,
            responsible_id: customer.id,
        };
        db::insert(uow, &link).await?;
        linked.push(patient_id);
    }

    for pet in relations.pets {
        let pet = pet.into_pet(customer.id, customer.customer_establishment);
        upsert::create(uow, &pet).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{EstablishmentInput, PetInput, PetSex, PetSize, Status};
    use crate::services::EstablishmentService;
    use serde_json::json;

    async fn setup() -> (Arc<dyn Store>, CustomerService, Uuid) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let establishments = EstablishmentService::new(store.clone(), PaginationConfig::default());
        let input: EstablishmentInput = serde_json::from_value(json!({
            "name": "Vida",
            "abbreviation": "VIDA",
            "cnpj": "00.000.000/0001-00",
            "establishmentType": "clinic",
            "mainPhone": "5581",
            "email": "vida@example.com",
            "targetCustomer": "HUMAN"
        }))
        .unwrap();
        let establishment = establishments.create(input).await.unwrap();
        let customers = CustomerService::new(store.clone(), PaginationConfig::default());
        (store, customers, establishment.establishment.id)
    }

    fn customer(name: &str, establishment: Uuid) -> CustomerInput {
        serde_json::from_value(json!({
            "name": name,
            "isPatient": true,
            "isResponsible": false,
            "isTutor": false,
            "establishmentBounded": establishment
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn responsibility_links_follow_add_and_remove() {
        let (_store, customers, establishment) = setup().await;
        let patient = customers.create(customer("Bia", establishment)).await.unwrap();
        let patient_id = patient.view.customer.id;

        let mut responsible = customer("Carla", establishment);
        responsible.is_responsible = true;
        responsible.patients_responsible_id_list = vec![patient_id];
        let created = customers.create(responsible).await.unwrap();
        assert_eq!(created.patient_responsible_list, vec![patient_id]);

        let id = created.view.customer.id;
        let mut again = customer("Carla", establishment);
        again.patients_responsible_id_list_to_add = vec![patient_id];
        let updated = customers.update(id, again).await.unwrap();
        assert_eq!(updated.patient_responsible_list, vec![patient_id]);

        let mut removal = customer("Carla", establishment);
        removal.patients_responsible_id_list_to_remove = vec![patient_id];
        let updated = customers.update(id, removal).await.unwrap();
        assert!(updated.patient_responsible_list.is_empty());
    }

    #[tokio::test]
    async fn unknown_patient_rolls_back_the_customer() {
        let (_store, customers, establishment) = setup().await;
        let mut responsible = customer("Carla", establishment);
        responsible.patients_responsible_id_list = vec![Uuid::new_v4()];
        let err = customers.create(responsible).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        let all = customers
            .list(&CustomerFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert!(all.items().is_empty());
    }

    #[tokio::test]
    async fn pets_are_registered_under_the_tutor() {
        let (store, customers, establishment) = setup().await;
        let mut tutor = customer("Davi", establishment);
        tutor.is_tutor = true;
        tutor.pets_list = vec![PetInput {
            pet_name: "Rex".to_string(),
            specie: "dog".to_string(),
            breed: None,
            age: None,
            size: PetSize::Medium,
            sex: PetSex::Male,
            status: Status::Active,
        }];
        let created = customers.create(tutor).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let pets = db::list::<crate::models::Pet>(
            uow.as_mut(),
            &RecordQuery::new(vec![Predicate::eq("customerOwner", created.view.customer.id)]),
        )
        .await
        .unwrap();
        assert_eq!(pets.total, 1);
        assert_eq!(pets.items[0].establishment_registered, establishment);
    }

    #[tokio::test]
    async fn type_filter_selects_role() {
        let (_store, customers, establishment) = setup().await;
        customers.create(customer("Bia", establishment)).await.unwrap();
        let mut tutor = customer("Davi", establishment);
        tutor.is_patient = false;
        tutor.is_tutor = true;
        customers.create(tutor).await.unwrap();

        let filter = CustomerFilter {
            customer_type: Some(CustomerType::parse("tutor").unwrap()),
            from_establishment: Some(establishment),
        };
        let tutors = customers.list(&filter, &ListParams::default()).await.unwrap();
        assert_eq!(tutors.items().len(), 1);
        assert_eq!(tutors.items()[0].customer.name, "Davi");
        assert!(CustomerType::parse("owner").is_err());
    }
}
