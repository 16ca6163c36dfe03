//! `/api/prescriptions`

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::extract::{list_params, ApiQuery, IdQuery, ValidatedJson},
    models::PrescriptionInput,
    services::prescriptions::PrescriptionFilter,
    state::AppState,
    Result,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionQuery {
    id: Option<Uuid>,
    from_establishment: Option<Uuid>,
    page: Option<u32>,
    page_size: Option<u32>,
}

pub async fn create_prescription(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<PrescriptionInput>,
) -> Result<Response> {
    let created = state.prescriptions.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn get_prescriptions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PrescriptionQuery>,
) -> Result<Response> {
    if let Some(id) = query.id {
        let found = state.prescriptions.get(id).await?;
        return Ok((StatusCode::OK, Json(found)).into_response());
    }
    let filter = PrescriptionFilter {
        from_establishment: query.from_establishment,
    };
    let params = list_params(query.page, query.page_size, None);
    let listing = state.prescriptions.list(&filter, &params).await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

/// Download the prescription as a PDF attachment.
pub async fn get_prescription_pdf(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Response> {
    let bytes = state.prescriptions.pdf(query.required()?).await?;

    let mut response = (StatusCode::OK, bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=prescription.pdf"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    Ok(response)
}
