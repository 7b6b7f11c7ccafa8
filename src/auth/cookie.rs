//! Cookie transport for authentication tokens.
//!
//! Defines the two token cookies and how they are rendered into Set-Cookie
//! headers. Both are HttpOnly with SameSite=Lax; the Secure flag is dropped
//! only in debug mode so local HTTP development works.

use axum::http::header;

use crate::jwt::{ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS};

/// Cookie name for the access token (short-lived, 1 hour).
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Cookie name for the refresh token (long-lived, 7 days).
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
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

/// Render a Set-Cookie value carrying a token.
fn build_auth_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        name, value, max_age, secure
    )
}

/// Render a Set-Cookie value for the access token.
pub fn access_cookie(token: &str, secure: bool) -> String {
    build_auth_cookie(ACCESS_COOKIE_NAME, token, ACCESS_TOKEN_DURATION_SECS, secure)
}

/// Render a Set-Cookie value for the refresh token.
pub fn refresh_cookie(token: &str, secure: bool) -> String {
    build_auth_cookie(
        REFRESH_COOKIE_NAME,
        token,
        REFRESH_TOKEN_DURATION_SECS,
        secure,
    )
}

/// Render a Set-Cookie value that expires a cookie immediately.
/// Sent regardless of whether the cookie was present in the request.
pub fn clear_cookie(name: &str, secure: bool) -> String {
    build_auth_cookie(name, "", 0, secure)
}
