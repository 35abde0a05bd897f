//! Session transport: cookie parsing, bearer fallback and Set-Cookie values.

use axum::http::{HeaderMap, header};

/// Cookie name for the access token (short-lived, 15 minutes).
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Cookie name for the refresh token (long-lived, 7 days).
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

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

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Locate the access token for a request. The cookie wins; the bearer header
/// is consulted only when the cookie is absent or empty and the fallback is on.
pub fn session_token(headers: &HeaderMap, bearer_fallback: bool) -> Option<&str> {
    match get_cookie(headers, ACCESS_COOKIE_NAME) {
        Some(token) if !token.is_empty() => Some(token),
        _ if bearer_fallback => bearer_token(headers),
        _ => None,
    }
}

fn secure_suffix(secure: bool) -> &'static str {
    if secure { "; Secure" } else { "" }
}

/// Set-Cookie value for a freshly issued access token.
pub fn access_cookie(token: &str, max_age: i64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        ACCESS_COOKIE_NAME,
        token,
        max_age.max(0),
        secure_suffix(secure)
    )
}

/// Set-Cookie value for a freshly issued refresh token.
pub fn refresh_cookie(token: &str, max_age: i64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}{}",
        REFRESH_COOKIE_NAME,
        token,
        max_age.max(0),
        secure_suffix(secure)
    )
}

pub fn clear_access_cookie(secure: bool) -> String {
    access_cookie("", 0, secure)
}

pub fn clear_refresh_cookie(secure: bool) -> String {
    refresh_cookie("", 0, secure)
}
