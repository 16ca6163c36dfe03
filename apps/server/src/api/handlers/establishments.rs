//! `/api/establishments` and `/api/units`

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
    models::{EstablishmentInput, UnitInput},
    state::AppState,
    Result,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    id: Option<Uuid>,
    page: Option<u32>,
    page_size: Option<u32>,
    search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateEstablishment {
    id_establishment_to_deactivate: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateUnit {
    id_unity_to_deactivate: Uuid,
}

pub async fn create_establishment(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<EstablishmentInput>,
) -> Result<Response> {
    let created = state.establishments.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn update_establishment(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ValidatedJson(input): ValidatedJson<EstablishmentInput>,
) -> Result<Response> {
    let updated = state.establishments.update(query.required()?, input).await?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

pub async fn get_establishments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Response> {
    if let Some(id) = query.id {
        let found = state.establishments.get(id).await?;
        return Ok((StatusCode::OK, Json(found)).into_response());
    }
    let params = list_params(query.page, query.page_size, query.search);
    let listing = state.establishments.list(&params).await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

pub async fn deactivate_establishment(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<DeactivateEstablishment>,
) -> Result<StatusCode> {
    state
        .establishments
        .deactivate(body.id_establishment_to_deactivate)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn create_unit(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UnitInput>,
) -> Result<Response> {
    let created = state.units.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn update_unit(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ValidatedJson(input): ValidatedJson<UnitInput>,
) -> Result<Response> {
    let updated = state.units.update(query.required()?, input).await?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

pub async fn get_units(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Response> {
    if let Some(id) = query.id {
        let found = state.units.get(id).await?;
        return Ok((StatusCode::OK, Json(found)).into_response());
    }
    let params = list_params(query.page, query.page_size, query.search);
    let listing = state.units.list(&params).await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

/// `?id=` names the establishment whose units are listed.
pub async fn get_units_from_establishment(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Response> {
    let establishment = IdQuery { id: query.id }.required()?;
    let params = list_params(query.page, query.page_size, query.search);
    let listing = state
        .units
        .list_for_establishment(establishment, &params)
        .await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

pub async fn deactivate_unit(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<DeactivateUnit>,
) -> Result<StatusCode> {
    state.units.deactivate(body.id_unity_to_deactivate).await?;
    Ok(StatusCode::OK)
}
