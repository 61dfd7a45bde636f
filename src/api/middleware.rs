//! Response-wide middleware: access log and `?pretty` JSON rendering.

use axum::{
    body::{Body, to_bytes},
    extract::Query,
    http::{HeaderValue, Request, Uri, header},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// One log line per request. The query string is left out so that
/// credentials passed there never reach the log.
pub async fn access_log(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}

/// Whether the query string carries a `pretty` parameter, with or without a value.
fn wants_pretty(uri: &Uri) -> bool {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .is_ok_and(|Query(params)| params.contains_key("pretty"))
}

fn is_json(response: &Response<Body>) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Re-render JSON response bodies indented when `?pretty` is present.
pub async fn pretty_json(request: Request<Body>, next: Next) -> Response<Body> {
    let pretty = wants_pretty(request.uri());
    let response = next.run(request).await;

    if !pretty || !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to buffer response body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let rendered = serde_json::from_slice::<serde_json::Value>(&bytes)
        .and_then(|value| serde_json::to_vec_pretty(&value));
    let body = match rendered {
        Ok(pretty) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            if let Ok(len) = HeaderValue::from_str(&pretty.len().to_string()) {
                parts.headers.insert(header::CONTENT_LENGTH, len);
            }
            Body::from(pretty)
        }
        Err(_) => Body::from(bytes),
    };
    Response::from_parts(parts, body)
}
