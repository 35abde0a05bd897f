//! Axum extractors reading the identity attached by the auth interceptors.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::AuthError;
use super::types::Identity;

/// Extractor for handlers behind [`RequireAuth`](super::RequireAuth).
/// Rejects with 401 if no identity was attached.
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::MissingToken)
    }
}

/// Optional identity, for handlers behind [`OptionalAuth`](super::OptionalAuth).
pub struct MaybeUser(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Identity>().cloned()))
    }
}
