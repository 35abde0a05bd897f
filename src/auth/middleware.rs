//! Request interceptors.
//!
//! Each interceptor implements [`Interceptor`] and is mounted with
//! [`intercept`]:
//!
//! ```ignore
//! router.layer(middleware::from_fn_with_state(
//!     Arc::new(RequireAuth::new(tokens, settings)),
//!     intercept::<RequireAuth>,
//! ))
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::cookie::session_token;
use super::errors::AuthError;
use super::types::Identity;
use crate::jwt::TokenService;

/// A request interceptor: inspect the request, then either answer it
/// directly or pass it on to `next`.
pub trait Interceptor: Send + Sync + 'static {
    fn handle(&self, request: Request, next: Next) -> impl Future<Output = Response> + Send;
}

/// Adapter turning an [`Interceptor`] into an axum middleware function.
pub async fn intercept<I: Interceptor>(
    State(interceptor): State<Arc<I>>,
    request: Request,
    next: Next,
) -> Response {
    interceptor.handle(request, next).await
}

/// Deployment switches for token extraction.
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    /// Accept `Authorization: Bearer` when the access cookie is absent.
    pub bearer_fallback: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            bearer_fallback: true,
        }
    }
}

/// Shared extraction and validation used by both auth interceptors.
fn authenticate(
    tokens: &TokenService,
    settings: &AuthSettings,
    headers: &HeaderMap,
) -> Result<Identity, AuthError> {
    let token = session_token(headers, settings.bearer_fallback).ok_or(AuthError::MissingToken)?;

    let claims = tokens.validate_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AuthError::InvalidToken
    })?;

    Ok(Identity::from_claims(claims))
}

/// Rejects requests without a valid access token.
#[derive(Clone)]
pub struct RequireAuth {
    tokens: Arc<TokenService>,
    settings: AuthSettings,
}

impl RequireAuth {
    pub fn new(tokens: Arc<TokenService>, settings: AuthSettings) -> Self {
        Self { tokens, settings }
    }
}

impl Interceptor for RequireAuth {
    async fn handle(&self, mut request: Request, next: Next) -> Response {
        let outcome = authenticate(&self.tokens, &self.settings, request.headers());
        match outcome {
            Ok(identity) => {
                request.extensions_mut().insert(identity);
                next.run(request).await
            }
            Err(rejection) => rejection.into_response(),
        }
    }
}

/// Attaches an identity when a valid access token is present; never rejects.
#[derive(Clone)]
pub struct OptionalAuth {
    tokens: Arc<TokenService>,
    settings: AuthSettings,
}

impl OptionalAuth {
    pub fn new(tokens: Arc<TokenService>, settings: AuthSettings) -> Self {
        Self { tokens, settings }
    }
}

impl Interceptor for OptionalAuth {
    async fn handle(&self, mut request: Request, next: Next) -> Response {
        if let Ok(identity) = authenticate(&self.tokens, &self.settings, request.headers()) {
            request.extensions_mut().insert(identity);
        }
        next.run(request).await
    }
}
