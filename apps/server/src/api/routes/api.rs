use crate::api::handlers::{catalog, establishments, people, prescriptions};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};

/// Everything under `/api`. Authentication is layered on by the caller.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Establishments and their units
        .route(
            "/establishments",
            post(establishments::create_establishment)
                .put(establishments::update_establishment)
                .get(establishments::get_establishments),
        )
        .route(
            "/establishments/deactivate",
            patch(establishments::deactivate_establishment),
        )
        .route(
            "/units",
            post(establishments::create_unit)
                .put(establishments::update_unit)
                .get(establishments::get_units),
        )
        .route("/units/deactivate", patch(establishments::deactivate_unit))
        .route(
            "/units/from-establishment",
            get(establishments::get_units_from_establishment),
        )
        // Catalogs
        .route(
            "/establishments/types",
            post(catalog::create_establishment_type)
                .put(catalog::update_establishment_type)
                .get(catalog::get_establishment_types),
        )
        .route(
            "/establishments/types/deactivate",
            patch(catalog::deactivate_establishment_type),
        )
        .route(
            "/professionals/documents",
            post(catalog::create_regional_document_type)
                .put(catalog::update_regional_document_type)
                .get(catalog::get_regional_document_types),
        )
        .route(
            "/professionals/documents/deactivate",
            patch(catalog::deactivate_regional_document_type),
        )
        .route(
            "/medicines",
            post(catalog::create_medicine).get(catalog::get_medicines),
        )
        // People
        .route(
            "/professionals",
            post(people::create_professional)
                .put(people::update_professional)
                .get(people::get_professionals),
        )
        .route(
            "/professionals/deactivate",
            patch(people::deactivate_professional),
        )
        .route(
            "/customers",
            post(people::create_customer)
                .put(people::update_customer)
                .get(people::get_customers),
        )
        .route("/customers/deactivate", patch(people::deactivate_customer))
        .route("/pets", get(people::get_pets))
        .route("/pets/deactivate", patch(people::deactivate_pet))
        // Prescriptions
        .route(
            "/prescriptions",
            post(prescriptions::create_prescription).get(prescriptions::get_prescriptions),
        )
        .route(
            "/prescriptions/pdf",
            get(prescriptions::get_prescription_pdf),
        )
}
