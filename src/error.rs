/*
 * Responsibility
 * - AppError shared by all handlers
 * - IntoResponse (HTTP status / JSON error body)
 * - maps form and submit errors onto statuses
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::form::validation::ValidationState;
use crate::form::{FormError, SubmitError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationState>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("{code}: {message}")]
    Conflict { code: &'static str, message: String },
    #[error("validation failed")]
    Validation(ValidationState),
    #[error("upstream: {0}")]
    Upstream(String),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match self {
            AppError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, code, message, None)
            }
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message, None),
            AppError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                "some fields need attention".into(),
                Some(fields),
            ),
            AppError::Upstream(message) => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILED", message, None),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                fields,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<FormError> for AppError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::Busy => AppError::conflict("BUSY", e.to_string()),
            FormError::Interrupted => AppError::Internal,
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Busy => AppError::conflict("BUSY", e.to_string()),
            SubmitError::MissingIdentity => AppError::bad_request("MISSING_IDENTITY", e.to_string()),
            SubmitError::Invalid(fields) => AppError::Validation(fields),
            SubmitError::Update(_) | SubmitError::ImageUpload(_) => AppError::Upstream(e.to_string()),
            SubmitError::Interrupted => AppError::Internal,
        }
    }
}
