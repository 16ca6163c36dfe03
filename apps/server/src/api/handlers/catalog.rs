//! `/api/medicines`, `/api/establishments/types` and
//! `/api/professionals/documents`

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::extract::{list_params, ApiQuery, IdQuery, ValidatedJson},
    auth::Principal,
    models::{EstablishmentTypeInput, MedicineInput, RegionalDocumentTypeInput},
    services::ListParams,
    state::AppState,
    Result,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    id: Option<Uuid>,
    available_for: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
    search: Option<String>,
}

impl CatalogQuery {
    fn params(&self) -> ListParams {
        list_params(self.page, self.page_size, self.search.clone())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateEstablishmentType {
    id_establishment_type_to_deactivate: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateRegionalDocumentType {
    id_regional_document_type_to_deactivate: Uuid,
}

pub async fn create_medicine(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<MedicineInput>,
) -> Result<Response> {
    let created = state
        .medicines
        .create(input.into_medicine(Uuid::new_v4()))
        .await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn get_medicines(
    State(state): State<AppState>,
    principal: Principal,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<Response> {
    if let Some(id) = query.id {
        let found = state.medicines.get(id).await?;
        return Ok((StatusCode::OK, Json(found)).into_response());
    }
    let listing = state
        .medicines
        .list(
            query.available_for.as_deref(),
            principal.establishment_id,
            &query.params(),
        )
        .await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

pub async fn create_establishment_type(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<EstablishmentTypeInput>,
) -> Result<Response> {
    let created = state
        .establishment_types
        .create(input.into_type(Uuid::new_v4()))
        .await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn update_establishment_type(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ValidatedJson(input): ValidatedJson<EstablishmentTypeInput>,
) -> Result<Response> {
    let updated = state
        .establishment_types
        .update(input.into_type(query.required()?))
        .await?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

pub async fn get_establishment_types(
    State(state): State<AppState>,
    principal: Principal,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<Response> {
    if let Some(id) = query.id {
        let found = state.establishment_types.get(id).await?;
        return Ok((StatusCode::OK, Json(found)).into_response());
    }
    let listing = state
        .establishment_types
        .list(
            query.available_for.as_deref(),
            principal.establishment_id,
            &query.params(),
        )
        .await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

pub async fn deactivate_establishment_type(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<DeactivateEstablishmentType>,
) -> Result<StatusCode> {
    state
        .establishment_types
        .deactivate(body.id_establishment_type_to_deactivate)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn create_regional_document_type(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegionalDocumentTypeInput>,
) -> Result<Response> {
    let created = state
        .regional_document_types
        .create(input.into_type(Uuid::new_v4()))
        .await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn update_regional_document_type(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ValidatedJson(input): ValidatedJson<RegionalDocumentTypeInput>,
) -> Result<Response> {
    let updated = state
        .regional_document_types
        .update(input.into_type(query.required()?))
        .await?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

pub async fn get_regional_document_types(
    State(state): State<AppState>,
    principal: Principal,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<Response> {
    if let Some(id) = query.id {
        let found = state.regional_document_types.get(id).await?;
        return Ok((StatusCode::OK, Json(found)).into_response());
    }
    let listing = state
        .regional_document_types
        .list(
            query.available_for.as_deref(),
            principal.establishment_id,
            &query.params(),
        )
        .await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

pub async fn deactivate_regional_document_type(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<DeactivateRegionalDocumentType>,
) -> Result<StatusCode> {
    state
        .regional_document_types
        .deactivate(body.id_regional_document_type_to_deactivate)
        .await?;
    Ok(StatusCode::OK)
}
