//! Session token transport: cookie parsing, bearer header, cookie rendering.

use axum::http::{HeaderMap, header};

use crate::jwt::IssuedToken;

/// Cookie name for the session token.
pub const SESSION_COOKIE_NAME: &str = "token";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn get_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The session token presented with a request: cookie first, then bearer header.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    get_cookie(headers, SESSION_COOKIE_NAME)
        .filter(|token| !token.is_empty())
        .or_else(|| get_bearer(headers))
}

/// `Set-Cookie` value delivering a freshly issued token.
pub fn session_cookie(issued: &IssuedToken, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        SESSION_COOKIE_NAME, issued.token, issued.duration, secure
    )
}
