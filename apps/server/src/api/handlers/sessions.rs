//! `/sessions`

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    api::extract::ValidatedJson, auth::Principal, services::sessions::Credentials,
    state::AppState, Result,
};

pub async fn authenticate(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<Credentials>,
) -> Result<Response> {
    let token = state.sessions.authenticate(&credentials).await?;
    Ok((StatusCode::CREATED, Json(token)).into_response())
}

pub async fn recover_user_data(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Response> {
    let data = state.sessions.recover_user_data(&principal).await?;
    Ok((StatusCode::OK, Json(data)).into_response())
}
