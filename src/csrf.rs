//! CSRF (Cross-Site Request Forgery) guard.
//!
//! Tokens are random and carry no server-side record. The guard only checks
//! that a state-changing request supplies a non-empty `X-CSRF-Token` header;
//! it does not compare the value against anything that was issued.

use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::{TryRngCore, rngs::OsRng};

use crate::auth::{CsrfRejection, Interceptor};

/// Header carrying the caller-supplied anti-forgery value.
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// Number of random bytes in a generated token (hex-encoded to 64 characters).
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Errors generating a CSRF token.
#[derive(Debug, thiserror::Error)]
pub enum CsrfError {
    #[error("secure random source unavailable: {0}")]
    RandomSource(String),
}

/// Generate a fresh CSRF token from the OS random source.
pub fn generate_token() -> Result<String, CsrfError> {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CsrfError::RandomSource(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Presence check: any non-empty value is accepted.
pub fn validate_token(value: impl AsRef<[u8]>) -> bool {
    !value.as_ref().is_empty()
}

/// Whether a method changes server state and therefore needs the header.
pub fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Interceptor rejecting state-changing requests that lack the CSRF header.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfGuard;

impl Interceptor for CsrfGuard {
    async fn handle(&self, request: Request, next: Next) -> Response {
        if !is_state_changing(request.method()) {
            return next.run(request).await;
        }

        // Raw bytes: a value with non-visible-ASCII octets is still present.
        let supplied = request
            .headers()
            .get(CSRF_HEADER_NAME)
            .map(|v| v.as_bytes())
            .unwrap_or_default();

        if !validate_token(supplied) {
            tracing::debug!(method = %request.method(), path = %request.uri().path(), "Missing CSRF token");
            return CsrfRejection.into_response();
        }

        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), CSRF_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(token.chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_token_unique() {
        let tokens: HashSet<String> = (0..64).map(|_| generate_token().unwrap()).collect();
        assert_eq!(tokens.len(), 64);
    }

    #[test]
    fn test_validate_token_presence_only() {
        assert!(validate_token("anything"));
        assert!(validate_token("not-a-real-token"));
        assert!(validate_token(&generate_token().unwrap()));
        assert!(!validate_token(""));
    }

    #[test]
    fn test_validate_token_accepts_opaque_bytes() {
        assert!(validate_token([0xff_u8, 0xfe].as_slice()));
        assert!(!validate_token(b"".as_slice()));
    }

    #[tokio::test]
    async fn test_guard_accepts_non_ascii_header() {
        use axum::{
            Router,
            body::Body,
            http::{HeaderValue, Request as HttpRequest, StatusCode},
            middleware,
            routing::post,
        };
        use std::sync::Arc;
        use tower::ServiceExt;

        let app = Router::new()
            .route("/submit", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                Arc::new(CsrfGuard),
                crate::auth::intercept::<CsrfGuard>,
            ));

        let mut request = HttpRequest::builder()
            .method("POST")
            .uri("/submit")
            .body(Body::empty())
            .unwrap();
        request.headers_mut().insert(
            CSRF_HEADER_NAME,
            HeaderValue::from_bytes(&[b't', 0xe9, b'k']).unwrap(),
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = HttpRequest::builder()
            .method("POST")
            .uri("/submit")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_state_changing_methods() {
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(is_state_changing(&method), "{method} should be guarded");
        }
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(!is_state_changing(&method), "{method} should pass");
        }
    }
}
