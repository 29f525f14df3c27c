use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::validation::Violation;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the goal and auth services.
///
/// Every message is safe to show to an end user. Storage faults carry only a
/// generic description; the underlying error is logged where it is caught.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation failed")]
    Validation(Vec<Violation>),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User with email {0} already exists")]
    UserAlreadyExists(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Storage(&'static str),
}

impl ServiceError {
    /// Logs a lower-level fault and replaces it with a sanitized storage error.
    pub fn storage(context: &'static str, err: impl std::fmt::Display) -> Self {
        error!(error = %err, "{}", context);
        ServiceError::Storage(context)
    }

    fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::InvalidCredentials => "invalid_credentials",
            ServiceError::UserAlreadyExists(_) => "user_already_exists",
            ServiceError::InvalidToken => "invalid_token",
            ServiceError::MissingToken => "unauthorized",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Storage(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::InvalidCredentials
            | ServiceError::InvalidToken
            | ServiceError::MissingToken => StatusCode::UNAUTHORIZED,
            ServiceError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn malformed(field: &str, message: String) -> ServiceError {
    tracing::debug!(field, %message, "request rejected before validation");
    ServiceError::Validation(vec![Violation::new(field, &message)])
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        malformed("body", rejection.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(rejection: PathRejection) -> Self {
        malformed("path", rejection.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        malformed("query", rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<Violation>>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            details: match self {
                ServiceError::Validation(v) => Some(v),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}
