//! Request extractors that reject with the crate's own error body.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::{services::ListParams, Error, Result};

/// JSON body deserialized and checked with its `validator` rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| Error::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string extractor whose failures are validation errors.
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `?id=` for updates and downloads.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct IdQuery {
    pub id: Option<Uuid>,
}

impl IdQuery {
    pub fn required(&self) -> Result<Uuid> {
        self.id
            .ok_or_else(|| Error::Validation("Id was not provided".to_string()))
    }
}

pub fn list_params(page: Option<u32>, page_size: Option<u32>, search: Option<String>) -> ListParams {
    ListParams {
        page,
        page_size,
        search,
    }
}
