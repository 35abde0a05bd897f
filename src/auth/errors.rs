//! Authentication and CSRF rejections.
//!
//! The token error kind is never exposed here: every validation failure
//! renders the same 401 body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

/// Rejection from the authentication interceptors and extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No token in the cookie (or bearer header, where enabled).
    MissingToken,
    /// A token was presented but failed validation for any reason.
    InvalidToken,
}

impl AuthError {
    fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing authentication token",
            AuthError::InvalidToken => "invalid or expired token",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

/// Rejection from the CSRF guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrfRejection;

impl IntoResponse for CsrfRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "missing CSRF token",
            }),
        )
            .into_response()
    }
}
