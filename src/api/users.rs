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
use crate::requests::UserRequest;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(create_user))
        .with_state(state)
}

async fn create_user(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Payload(request): Payload<UserRequest>,
) -> Result<Response, AppError> {
    let id = state
        .endpoints
        .create_user(&Envelope::new(headers), request)
        .await?;
    Ok(created(id))
}
