//! Domain models
//!
//! Every entity is persisted as a camelCase JSON document identical to its
//! wire representation. [`EntityKind`] carries the storage metadata shared by
//! both stores: the kind name, the unique fields in priority order and the
//! field that scopes uniqueness.

mod address;
mod catalog;
mod customer;
mod establishment;
mod medicine;
mod pet;
mod prescription;
mod professional;
mod unit;

pub use address::{Address, AddressFields};
pub use catalog::{
    AvailableFor, EstablishmentType, EstablishmentTypeInput, RegionalDocumentType,
    RegionalDocumentTypeInput,
};
pub use customer::{Customer, CustomerInput, CustomerRelations, PatientResponsible};
pub use establishment::{Establishment, EstablishmentInput, TargetCustomer};
pub use medicine::{Medicine, MedicineInput, MedicineUse, PharmaceuticalForm, RegulatoryCategory};
pub use pet::{Pet, PetInput, PetSex, PetSize};
pub use prescription::{
    AdministrationWay, PrescribedMedicine, PrescribedMedicineInput, Prescription,
    PrescriptionInput, PrescriptionSubject, PrescriptionType,
};
pub use professional::{BoundedTo, Professional, ProfessionalInput, ProfessionalRole};
pub use unit::{Unit, UnitInput};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status shared by every administrative entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Active,
    Deactivated,
}

impl Status {
    /// Only ACTIVE -> DEACTIVATED is allowed; staying put is always fine.
    pub fn can_become(self, next: Status) -> bool {
        !(self == Status::Deactivated && next == Status::Active)
    }
}

/// How uniqueness of a kind's fields is scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueScope {
    Global,
    /// Unique among records sharing this field's value. A null value is its
    /// own scope.
    Field(&'static str),
}

/// Storage kinds. The string form is the `kind` column of the records table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Address,
    Establishment,
    Unit,
    Professional,
    Customer,
    PatientResponsible,
    Pet,
    Medicine,
    EstablishmentType,
    RegionalDocumentType,
    Prescription,
    PrescribedMedicine,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Establishment => "establishment",
            Self::Unit => "unit",
            Self::Professional => "professional",
            Self::Customer => "customer",
            Self::PatientResponsible => "patient_responsible",
            Self::Pet => "pet",
            Self::Medicine => "medicine",
            Self::EstablishmentType => "establishment_type",
            Self::RegionalDocumentType => "regional_document_type",
            Self::Prescription => "prescription",
            Self::PrescribedMedicine => "prescribed_medicine",
        }
    }

    /// Human label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Address => "Address",
            Self::Establishment => "Establishment",
            Self::Unit => "Unity",
            Self::Professional => "Professional",
            Self::Customer => "Customer",
            Self::PatientResponsible => "Patient responsible",
            Self::Pet => "Pet",
            Self::Medicine => "Medicine",
            Self::EstablishmentType => "Establishment type",
            Self::RegionalDocumentType => "Regional document type",
            Self::Prescription => "Prescription",
            Self::PrescribedMedicine => "Prescribed medicine",
        }
    }

    /// Unique fields in the order violations are reported.
    pub fn unique_fields(self) -> &'static [&'static str] {
        match self {
            Self::Establishment | Self::Unit => &["name", "abbreviation", "cnpj", "email"],
            Self::Professional => &["email", "cpf"],
            Self::Customer => &["name", "cpf", "otherDocument"],
            Self::Medicine | Self::EstablishmentType | Self::RegionalDocumentType => &["name"],
            _ => &[],
        }
    }

    pub fn unique_scope(self) -> UniqueScope {
        match self {
            Self::Professional => UniqueScope::Field("establishmentBounded"),
            Self::Customer => UniqueScope::Field("customerEstablishment"),
            Self::Medicine => UniqueScope::Field("establishmentRegistered"),
            _ => UniqueScope::Global,
        }
    }
}

/// A document persisted in the records table.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> Uuid;
}

/// Entities that own an optional address row.
pub trait AddressOwner: Entity {
    fn address_id(&self) -> Option<Uuid>;
    fn set_address_id(&mut self, id: Option<Uuid>);
}

/// Entities with an ACTIVE/DEACTIVATED lifecycle.
pub trait Lifecycle: Entity {
    fn status(&self) -> Status;
    fn set_status(&mut self, status: Status);
}

macro_rules! impl_entity {
    ($ty:ty, $kind:expr, lifecycle, address = $field:ident) => {
        $crate::models::impl_entity!($ty, $kind, lifecycle);

        impl $crate::models::AddressOwner for $ty {
            fn address_id(&self) -> Option<uuid::Uuid> {
                self.$field
            }

            fn set_address_id(&mut self, id: Option<uuid::Uuid>) {
                self.$field = id;
            }
        }
    };
    ($ty:ty, $kind:expr, lifecycle) => {
        $crate::models::impl_entity!($ty, $kind);

        impl $crate::models::Lifecycle for $ty {
            fn status(&self) -> $crate::models::Status {
                self.status
            }

            fn set_status(&mut self, status: $crate::models::Status) {
                self.status = status;
            }
        }
    };
    ($ty:ty, $kind:expr) => {
        impl $crate::models::Entity for $ty {
            const KIND: $crate::models::EntityKind = $kind;

            fn id(&self) -> uuid::Uuid {
                self.id
            }
        }
    };
}
pub(crate) use impl_entity;

/// Deserialization helpers for loosely typed client input.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText<T> {
        Number(T),
        Text(String),
    }

    /// Accepts `12`, `"12"`, `""` and `null`; blank text is treated as absent.
    pub fn opt_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + std::str::FromStr,
    {
        match Option::<NumberOrText<T>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Number(n)) => Ok(Some(n)),
            Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(NumberOrText::Text(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a number"))),
        }
    }
}
