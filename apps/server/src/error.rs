//! Error types and their HTTP representation

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing input, rejected before any store access.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation, missing referenced record or forbidden transition.
    #[error("{message}")]
    Conflict {
        field: Option<String>,
        message: String,
    },

    /// A collaborator (address sub-write, document renderer) failed.
    #[error("{0}")]
    Dependency(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Dependency(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Dependency(_) => "dependency_failure",
            Self::Database(_) | Self::Internal(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        // Unique indexes are named `uq_<kind>_<field>`; surface them as conflicts.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = db_err
                    .constraint()
                    .and_then(|c| c.strip_prefix("uq_"))
                    .and_then(|c| c.rsplit_once('_'))
                    .map(|(_, field)| field.to_string());
                let message = match &field {
                    Some(f) => format!("Record with same {f} already exists"),
                    None => "Record already exists".to_string(),
                };
                return Self::Conflict { field, message };
            }
        }
        Self::Database(err)
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        Self::Validation(format!("Invalid fields: {}", fields.join(", ")))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side failures never leak details to the client.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "request failed");
            match &self {
                Self::Dependency(_) => "Dependency failure".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "request rejected");
            self.to_string()
        };

        let mut body = json!({
            "error": self.kind(),
            "message": message,
        });
        if let Self::Conflict {
            field: Some(field), ..
        } = &self
        {
            body["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}
