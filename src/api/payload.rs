//! JSON body decoding that reports failures as `MalformedPayload`.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Decoded JSON request body. Content type is not checked.
pub struct Payload<T>(pub T);

/// Like `Payload`, but an empty body decodes to `T::default()`.
pub struct OptionalPayload<T>(pub T);

async fn body_bytes<S: Send + Sync>(req: Request, state: &S) -> Result<Bytes, AppError> {
    Bytes::from_request(req, state)
        .await
        .map_err(|rejection| AppError::MalformedPayload(rejection.body_text()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(bytes).map_err(|e| AppError::MalformedPayload(e.to_string()))
}

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = body_bytes(req, state).await?;
        decode(&bytes).map(Payload)
    }
}

impl<S, T> FromRequest<S> for OptionalPayload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = body_bytes(req, state).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalPayload(T::default()));
        }
        decode(&bytes).map(OptionalPayload)
    }
}
