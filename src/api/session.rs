//! Login and token refresh. Both answer with an empty 200 and deliver the
//! token through `Set-Cookie`.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};

use super::ApiState;
use super::payload::{OptionalPayload, Payload};
use crate::auth::session_cookie;
use crate::error::AppError;
use crate::jwt::IssuedToken;
use crate::pipeline::Envelope;
use crate::requests::{LoginRequest, ReAuthRequest};

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/auth", post(login))
        .route("/reauth", post(reauth))
        .with_state(state)
}

fn session_response(issued: &IssuedToken, secure: bool) -> Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(issued, secure))],
    )
        .into_response()
}

async fn login(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Payload(request): Payload<LoginRequest>,
) -> Result<Response, AppError> {
    let issued = state
        .endpoints
        .login(&Envelope::new(headers), request)
        .await?;
    Ok(session_response(&issued, state.secure_cookies))
}

/// The body may be empty; the token then comes from the cookie or bearer header.
async fn reauth(
    State(state): State<ApiState>,
    headers: HeaderMap,
    OptionalPayload(request): OptionalPayload<ReAuthRequest>,
) -> Result<Response, AppError> {
    let issued = state
        .endpoints
        .reauth(&Envelope::new(headers), request)
        .await?;
    Ok(session_response(&issued, state.secure_cookies))
}
