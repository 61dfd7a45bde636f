//! Error taxonomy shared by every layer of the request pipeline.
//!
//! Expected failures (validation, authentication, bad payloads) carry just
//! enough data to render a response. Internal failures keep their detail for
//! the server log only; see `api::error` for the wire encoding.

use std::backtrace::Backtrace;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// One violated rule on one field of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub failed_field: String,
    pub condition: String,
    pub actual_value: String,
}

impl FieldViolation {
    pub fn new(
        failed_field: impl Into<String>,
        condition: impl Into<String>,
        actual_value: impl Into<String>,
    ) -> Self {
        Self {
            failed_field: failed_field.into(),
            condition: condition.into(),
            actual_value: actual_value.into(),
        }
    }
}

/// Every violation found in a single validation pass, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(violation: FieldViolation) -> Self {
        Self(vec![violation])
    }

    pub fn push(&mut self, violation: FieldViolation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// `Ok(())` when nothing was collected, otherwise the whole list as an error.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) failed validation", self.0.len())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("missing session token")]
    MissingToken,
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Log an unexpected failure with a captured stack and wrap it as `Internal`.
    pub fn internal(context: &str, e: impl fmt::Display) -> Self {
        let backtrace = Backtrace::capture();
        error!(error = %e, %backtrace, "{}", context);
        Self::Internal(format!("{}: {}", context, e))
    }

    pub fn validation(violation: FieldViolation) -> Self {
        Self::ValidationFailed(ValidationErrors::single(violation))
    }
}

/// Extension trait for concise internal-error mapping on Results.
pub trait ResultExt<T> {
    fn internal(self, context: &str) -> Result<T, AppError>;
}

impl<T, E: fmt::Display> ResultExt<T> for Result<T, E> {
    fn internal(self, context: &str) -> Result<T, AppError> {
        self.map_err(|e| AppError::internal(context, e))
    }
}
