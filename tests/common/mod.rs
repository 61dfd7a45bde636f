#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use jsonwebtoken::{EncodingKey, Header};
use marketplace::{
    ServerConfig, create_app,
    db::Database,
    jwt::{SessionClaims, unix_now},
};
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-for-integration!";

pub const USER: &str = "a@b.com";
pub const PASSWORD: &str = "secret1";

pub async fn create_test_app() -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: JWT_SECRET.to_vec(),
        secure_cookies: false,
    };
    (create_app(&config), db)
}

/// POST a JSON body, optionally presenting a session cookie.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &str,
    token: Option<&str>,
) -> Response<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::COOKIE, format!("token={}", token));
    }

    app.clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// The token delivered by a `Set-Cookie: token=...` header.
pub fn session_token(response: &Response<Body>) -> Option<String> {
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?;
    let (pair, _) = cookie.split_once(';')?;
    pair.strip_prefix("token=").map(str::to_string)
}

pub async fn register(app: &Router, name: &str, password: &str) -> Response<Body> {
    let body = serde_json::json!({ "name": name, "password": password }).to_string();
    post_json(app, "/users", &body, None).await
}

/// Register the default user and log in, returning the session token.
pub async fn signed_in(app: &Router) -> String {
    register(app, USER, PASSWORD).await;
    let body = serde_json::json!({ "user_name": USER, "password": PASSWORD }).to_string();
    let response = post_json(app, "/auth", &body, None).await;
    session_token(&response).expect("login should set a session cookie")
}

/// Sign a token for `subject` that expires `offset` seconds from now.
pub fn token_expiring_in(subject: &str, offset: i64) -> String {
    let now = unix_now().unwrap();
    let claims = SessionClaims {
        sub: subject.to_string(),
        iat: now - 60,
        exp: now.saturating_add_signed(offset),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .unwrap()
}

pub async fn row_count(db: &Database, table: &str) -> i64 {
    let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db.pool())
        .await
        .unwrap();
    count.0
}
