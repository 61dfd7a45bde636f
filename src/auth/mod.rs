//! Session authentication.
//!
//! Stateless 5 minute tokens delivered in a cookie (or bearer header) and
//! refreshable only during the last 30 seconds of their life.

mod cookie;
mod service;

pub use cookie::{SESSION_COOKIE_NAME, get_bearer, get_cookie, session_cookie, session_token};
pub use service::{AuthService, REFRESH_WINDOW, TokenState};
