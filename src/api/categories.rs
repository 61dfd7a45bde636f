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
use crate::requests::CategoryRequest;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(create_category))
        .with_state(state)
}

/// Requires a session.
async fn create_category(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Payload(request): Payload<CategoryRequest>,
) -> Result<Response, AppError> {
    let id = state
        .endpoints
        .create_category(&Envelope::new(headers), request)
        .await?;
    Ok(created(id))
}
