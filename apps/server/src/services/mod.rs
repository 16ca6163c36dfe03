//! Business logic layer
//!
//! Services sequence validation, uniqueness, address reconciliation and the
//! entity writes inside one unit of work, then shape the response.

pub mod address;
pub mod catalog;
pub mod customers;
pub mod establishments;
pub mod pets;
pub mod prescriptions;
pub mod professionals;
pub mod projection;
pub mod render;
pub mod sessions;
pub mod uniqueness;
pub mod units;
pub mod upsert;

pub use catalog::{
    CatalogService, CatalogView, EstablishmentTypeService, MedicineService,
    RegionalDocumentTypeService,
};
pub use customers::CustomerService;
pub use establishments::EstablishmentService;
pub use pets::PetService;
pub use prescriptions::PrescriptionService;
pub use professionals::ProfessionalService;
pub use projection::{ListParams, Listing};
pub use render::{CommandRenderer, DocumentRenderer, PrescriptionDocument, TemplateKind};
pub use sessions::SessionService;
pub use units::UnitService;
