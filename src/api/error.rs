//! Wire encoding of `AppError`.
//!
//! Validation failures keep their full violation list. Every other kind is
//! reduced to the canonical reason phrase of its status, so internal detail
//! never reaches the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, ValidationErrors};

pub const VALIDATION_FAILED_MSG: &str = "validation failed";

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

#[derive(Serialize)]
struct ValidationResponse<'a> {
    msg: &'static str,
    errors: &'a ValidationErrors,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed(_) | AppError::MalformedPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthenticationFailed | AppError::MissingToken => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::ValidationFailed(errors) => {
                debug!(violations = errors.len(), "Request failed validation");
                return (
                    status,
                    Json(ValidationResponse {
                        msg: VALIDATION_FAILED_MSG,
                        errors,
                    }),
                )
                    .into_response();
            }
            // Already logged where it was created
            AppError::Internal(_) => {}
            other => debug!(error = %other, "Request rejected"),
        }

        let reason = status.canonical_reason().unwrap_or("Unknown");
        (status, Json(ErrorResponse { error: reason })).into_response()
    }
}
