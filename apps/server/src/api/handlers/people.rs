//! `/api/professionals`, `/api/customers` and `/api/pets`

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
    models::{CustomerInput, ProfessionalInput},
    services::{
        customers::{CustomerFilter, CustomerType},
        pets::PetFilter,
        professionals::ProfessionalFilter,
    },
    state::AppState,
    Result,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalQuery {
    id: Option<Uuid>,
    from_establishment: Option<Uuid>,
    is_health_professional: Option<bool>,
    page: Option<u32>,
    page_size: Option<u32>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    id: Option<Uuid>,
    #[serde(rename = "type")]
    customer_type: Option<String>,
    from_establishment: Option<Uuid>,
    page: Option<u32>,
    page_size: Option<u32>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetQuery {
    id: Option<Uuid>,
    owner_id: Option<Uuid>,
    from_establishment: Option<Uuid>,
    page: Option<u32>,
    page_size: Option<u32>,
    search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateProfessional {
    id_professional_to_deactivate: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateCustomer {
    id_customer_to_deactivate: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeactivatePet {
    id_pet_to_deactivate: Uuid,
}

pub async fn create_professional(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ProfessionalInput>,
) -> Result<Response> {
    let created = state.professionals.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn update_professional(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ValidatedJson(input): ValidatedJson<ProfessionalInput>,
) -> Result<Response> {
    let updated = state.professionals.update(query.required()?, input).await?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

pub async fn get_professionals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProfessionalQuery>,
) -> Result<Response> {
    if let Some(id) = query.id {
        let found = state.professionals.get(id).await?;
        return Ok((StatusCode::OK, Json(found)).into_response());
    }
    let filter = ProfessionalFilter {
        from_establishment: query.from_establishment,
        health_professionals_only: query.is_health_professional.unwrap_or(false),
    };
    let params = list_params(query.page, query.page_size, query.search);
    let listing = state.professionals.list(&filter, &params).await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

pub async fn deactivate_professional(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<DeactivateProfessional>,
) -> Result<StatusCode> {
    state
        .professionals
        .deactivate(body.id_professional_to_deactivate)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn create_customer(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CustomerInput>,
) -> Result<Response> {
    let created = state.customers.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn update_customer(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ValidatedJson(input): ValidatedJson<CustomerInput>,
) -> Result<Response> {
    let updated = state.customers.update(query.required()?, input).await?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

pub async fn get_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> Result<Response> {
    if let Some(id) = query.id {
        let found = state.customers.get(id).await?;
        return Ok((StatusCode::OK, Json(found)).into_response());
    }
    let filter = CustomerFilter {
        customer_type: query
            .customer_type
            .as_deref()
            .map(CustomerType::parse)
            .transpose()?,
        from_establishment: query.from_establishment,
    };
    let params = list_params(query.page, query.page_size, query.search);
    let listing = state.customers.list(&filter, &params).await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

pub async fn deactivate_customer(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<DeactivateCustomer>,
) -> Result<StatusCode> {
    state
        .customers
        .deactivate(body.id_customer_to_deactivate)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn get_pets(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PetQuery>,
) -> Result<Response> {
    if let Some(id) = query.id {
        let found = state.pets.get(id).await?;
        return Ok((StatusCode::OK, Json(found)).into_response());
    }
    let filter = PetFilter {
        owner_id: query.owner_id,
        from_establishment: query.from_establishment,
    };
    let params = list_params(query.page, query.page_size, query.search);
    let listing = state.pets.list(&filter, &params).await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

pub async fn deactivate_pet(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<DeactivatePet>,
) -> Result<StatusCode> {
    state.pets.deactivate(body.id_pet_to_deactivate).await?;
    Ok(StatusCode::OK)
}
