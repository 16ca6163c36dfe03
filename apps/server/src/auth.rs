//! Bearer token authentication for `/api/*` and `/sessions/*`.
//!
//! - `POST /sessions` exchanges professional credentials for an HS256 JWT.
//! - Every protected request carries `Authorization: Bearer <token>`; the
//!   middleware decodes it into a [`Principal`] stored in request extensions.
//! - Passwords are bcrypt hashes, checked on the blocking pool.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

use crate::{
    models::{Professional, ProfessionalRole},
    state::AppState,
    Config, Error, Result,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessClaims {
    sub: Uuid,
    name: String,
    access_level: ProfessionalRole,
    establishment_bounded: Uuid,
    iat: usize,
    exp: usize,
}

/// The authenticated professional behind a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub subject_id: Uuid,
    pub name: String,
    pub role: ProfessionalRole,
    pub establishment_id: Uuid,
}

#[derive(Clone)]
pub struct AuthManager {
    config: Arc<Config>,
    secret: Vec<u8>,
}

impl AuthManager {
    pub fn new(config: Arc<Config>) -> Self {
        let secret = match &config.auth.jwt_secret {
            Some(s) if !s.is_empty() => s.as_bytes().to_vec(),
            _ => {
                tracing::warn!(
                    "`auth.jwt_secret` is not set; using ephemeral secret (tokens reset on restart)"
                );
                format!("{}{}", Uuid::new_v4(), Uuid::new_v4()).into_bytes()
            }
        };

        Self { config, secret }
    }

    pub fn issue_token(&self, professional: &Professional) -> Result<String> {
        let now = now_epoch_seconds();
        let ttl = self.config.auth.token_ttl_seconds as usize;
        let claims = AccessClaims {
            sub: professional.id,
            name: professional.name.clone(),
            access_level: professional.role,
            establishment_bounded: professional.establishment_bounded,
            iat: now,
            exp: now.saturating_add(ttl),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| Error::Internal(format!("failed to sign access token: {e}")))
    }

    pub fn validate_token(&self, token: &str) -> Result<Principal> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data =
            decode::<AccessClaims>(token, &DecodingKey::from_secret(&self.secret), &validation)
                .map_err(|e| {
                    tracing::debug!(error = %e, "access token rejected");
                    Error::Unauthorized("Invalid access token.".to_string())
                })?;

        let claims = data.claims;
        Ok(Principal {
            subject_id: claims.sub,
            name: claims.name,
            role: claims.access_level,
            establishment_id: claims.establishment_bounded,
        })
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal> {
        let token = bearer_token(headers)
            .ok_or_else(|| Error::Unauthorized("Token not found.".to_string()))?;
        self.validate_token(token)
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.config.auth.bcrypt_cost
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let authz = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    authz
        .strip_prefix("Bearer ")
        .or_else(|| authz.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects unauthenticated requests before any handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match state.auth.authenticate(req.headers()) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| Error::Unauthorized("Token not found.".to_string()))
    }
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| Error::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| Error::Internal(format!("password hashing failed: {e}")))
}

/// False for a mismatch or an unreadable hash.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| Error::Internal(format!("password check task failed: {e}")))?;
    Ok(verified.unwrap_or(false))
}

fn now_epoch_seconds() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundedTo, Status};
    use axum::http::HeaderValue;

    fn professional() -> Professional {
        Professional {
            id: Uuid::new_v4(),
            name: "Dra. Ana".to_string(),
            email: "ana@example.com".to_string(),
            cpf: "123".to_string(),
            phone: "5581".to_string(),
            role: ProfessionalRole::HealthProfessional,
            birth_date: None,
            status: Status::Active,
            password: String::new(),
            especiality: None,
            bounded_to: BoundedTo::Establishment,
            establishment_bounded: Uuid::new_v4(),
            unity_bounded: None,
            regional_document: None,
            regional_document_type: None,
            state_document_issued: None,
            professional_address: None,
        }
    }

    #[test]
    fn issued_token_round_trips_to_principal() {
        let auth = AuthManager::new(Arc::new(Config::for_tests()));
        let professional = professional();
        let token = auth.issue_token(&professional).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let principal = auth.authenticate(&headers).unwrap();
        assert_eq!(principal.subject_id, professional.id);
        assert_eq!(principal.establishment_id, professional.establishment_bounded);
        assert_eq!(principal.role, ProfessionalRole::HealthProfessional);
    }

    #[test]
    fn foreign_signatures_are_rejected() {
        let auth = AuthManager::new(Arc::new(Config::for_tests()));
        let mut other_config = Config::for_tests();
        other_config.auth.jwt_secret = Some("another-secret-of-enough-length".to_string());
        let other = AuthManager::new(Arc::new(other_config));

        let token = other.issue_token(&professional()).unwrap();
        let err = auth.validate_token(&token).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert_eq!(err.to_string(), "Invalid access token.");
        assert!(matches!(
            auth.authenticate(&HeaderMap::new()),
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn bcrypt_hashes_verify() {
        let hash = hash_password("s3cret!", 4).await.unwrap();
        assert!(verify_password("s3cret!", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
        assert!(!verify_password("s3cret!", "not-a-hash").await.unwrap());
    }
}
