mod categories;
mod error;
mod middleware;
mod payload;
mod products;
mod session;
mod users;

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::endpoints::Endpoints;
use crate::error::AppError;

pub use error::VALIDATION_FAILED_MSG;
pub use middleware::{access_log, pretty_json};
pub use payload::{OptionalPayload, Payload};

/// Shared by every handler.
#[derive(Clone)]
pub struct ApiState {
    pub endpoints: Endpoints,
    /// Whether session cookies carry the `Secure` flag
    pub secure_cookies: bool,
}

#[derive(Serialize)]
struct CreatedResponse {
    id: String,
}

/// `201 Created` pointing at the new resource.
fn created(id: String) -> Response {
    (
        StatusCode::CREATED,
        [(header::LOCATION, format!("/{}", id))],
        Json(CreatedResponse { id }),
    )
        .into_response()
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Create the API router.
pub fn create_api_router(state: ApiState) -> Router {
    Router::new()
        .nest("/users", users::router(state.clone()))
        .nest("/categories", categories::router(state.clone()))
        .nest("/products", products::router(state.clone()))
        .merge(session::router(state))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
}
