use axum::{
    Router,
    extract::State,
    http::HeaderMap,
    response::Response,
    routing::post,
};

use super::payload::Payload;
use super::{ApiState, created};
use crate::error::AppError;
use crate::pipeline::Envelope;
use crate::requests::ProductRequest;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(create_product))
        .with_state(state)
}

/// Requires a session. The product and its features are written together or
/// not at all.
async fn create_product(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Payload(request): Payload<ProductRequest>,
) -> Result<Response, AppError> {
    let id = state
        .endpoints
        .create_product(&Envelope::new(headers), request)
        .await?;
    Ok(created(id))
}
