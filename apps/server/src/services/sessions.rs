//! Session service: credential exchange and the signed-in user's summary.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::{
    auth::{self, AuthManager, Principal},
    db::{self, Predicate, RecordQuery, Store},
    models::{Establishment, Professional, ProfessionalRole, Status},
    Error, Result,
};

const CREDENTIALS_MISMATCH: &str = "Professional credentials do not match.";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Establishment name or abbreviation.
    #[validate(length(min = 1))]
    pub organization: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub name: String,
    pub email: String,
    pub access_level: ProfessionalRole,
    pub organization: Option<String>,
}

fn mismatch() -> Error {
    Error::Unauthorized(CREDENTIALS_MISMATCH.to_string())
}

pub struct SessionService {
    store: Arc<dyn Store>,
    auth: Arc<AuthManager>,
}

impl SessionService {
    pub fn new(store: Arc<dyn Store>, auth: Arc<AuthManager>) -> Self {
        Self { store, auth }
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken> {
        let professional = {
            let mut uow = self.store.begin().await?;
            let organization = credentials.organization.trim();
            let establishments = db::list::<Establishment>(
                uow.as_mut(),
                &RecordQuery::new(vec![Predicate::Any(vec![
                    Predicate::eq("name", organization),
                    Predicate::eq("abbreviation", organization),
                ])]),
            )
            .await?;
            let establishment = establishments.items.into_iter().next().ok_or_else(mismatch)?;

            let professionals = db::list::<Professional>(
                uow.as_mut(),
                &RecordQuery::new(vec![
                    Predicate::eq("email", credentials.email.trim()),
                    Predicate::eq("establishmentBounded", establishment.id),
                ]),
            )
            .await?;
            professionals.items.into_iter().next().ok_or_else(mismatch)?
        };

        if professional.status == Status::Deactivated {
            tracing::info!(professional_id = %professional.id, "sign-in refused for deactivated professional");
            return Err(mismatch());
        }
        if !auth::verify_password(&credentials.password, &professional.password).await? {
            tracing::info!(professional_id = %professional.id, "sign-in refused: wrong password");
            return Err(mismatch());
        }

        let access_token = self.auth.issue_token(&professional)?;
        tracing::info!(professional_id = %professional.id, "professional signed in");
        Ok(AccessToken { access_token })
    }

    pub async fn recover_user_data(&self, principal: &Principal) -> Result<UserData> {
        let mut uow = self.store.begin().await?;
        let professional = db::require::<Professional>(uow.as_mut(), principal.subject_id).await?;
        let establishment =
            db::get::<Establishment>(uow.as_mut(), professional.establishment_bounded).await?;
        Ok(UserData {
            name: professional.name,
            email: professional.email,
            access_level: professional.role,
            organization: establishment.map(|e| e.abbreviation),
        })
    }
}
