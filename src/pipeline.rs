//! Ordered stage chain run in front of every endpoint.
//!
//! A `Pipeline` holds a list of stages. Each stage either lets the request
//! through or rejects it, and the first rejection ends the run before any
//! later stage or the endpoint is reached.

use async_trait::async_trait;
use axum::http::HeaderMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{AuthService, session_token};
use crate::error::AppError;
use crate::validate::{Validate, Validator};

/// Transport metadata travelling alongside a decoded request.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    headers: HeaderMap,
}

impl Envelope {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// Session token from the cookie or bearer header, if any.
    pub fn session_token(&self) -> Option<&str> {
        session_token(&self.headers)
    }
}

#[async_trait]
pub trait Stage<R: Sync>: Send + Sync {
    async fn process(&self, envelope: &Envelope, request: &R) -> Result<(), AppError>;
}

/// Rejects requests whose validation table reports any violation.
pub struct ValidationStage {
    validator: Validator,
}

impl ValidationStage {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl<R: Validate> Stage<R> for ValidationStage {
    async fn process(&self, _envelope: &Envelope, request: &R) -> Result<(), AppError> {
        self.validator.validate(request).await
    }
}

/// Rejects requests that carry no live session token.
pub struct AuthStage {
    auth: AuthService,
}

impl AuthStage {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl<R: Sync> Stage<R> for AuthStage {
    async fn process(&self, envelope: &Envelope, _request: &R) -> Result<(), AppError> {
        let claims = self.auth.verify(envelope.session_token())?;
        debug!(user = %claims.sub, "Session verified");
        Ok(())
    }
}

pub struct Pipeline<R: Sync> {
    stages: Vec<Arc<dyn Stage<R>>>,
}

impl<R: Sync> Clone for Pipeline<R> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
        }
    }
}

impl<R: Sync> Default for Pipeline<R> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<R: Sync> Pipeline<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage; stages run in the order they were added.
    pub fn stage(mut self, stage: impl Stage<R> + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Run every stage, then hand the request to `endpoint`.
    pub async fn run<T, F, Fut>(
        &self,
        envelope: &Envelope,
        request: R,
        endpoint: F,
    ) -> Result<T, AppError>
    where
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        for stage in &self.stages {
            stage.process(envelope, &request).await?;
        }
        endpoint(request).await
    }
}
