mod auth;
mod csrf;
mod error;
mod health;
mod message;

use axum::{Router, middleware};
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::auth::{AuthSettings, OptionalAuth, RequireAuth, intercept};
use crate::csrf::CsrfGuard;
use crate::db::Database;
use crate::jwt::TokenService;

pub use error::{ApiError, ResultExt};
pub use message::ANONYMOUS_GREETING;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    tokens: Arc<TokenService>,
    settings: AuthSettings,
    secure_cookies: bool,
) -> Router {
    let auth_state = auth::AuthState {
        db: db.clone(),
        tokens: tokens.clone(),
        secure_cookies,
    };

    // ServiceBuilder runs top to bottom: authentication before the CSRF check.
    let protected = auth::protected_router(auth_state.clone()).layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn_with_state(
                Arc::new(RequireAuth::new(tokens.clone(), settings)),
                intercept::<RequireAuth>,
            ))
            .layer(middleware::from_fn_with_state(
                Arc::new(CsrfGuard),
                intercept::<CsrfGuard>,
            )),
    );

    let personalized = message::router().layer(middleware::from_fn_with_state(
        Arc::new(OptionalAuth::new(tokens, settings)),
        intercept::<OptionalAuth>,
    ));

    Router::new()
        .merge(auth::public_router(auth_state))
        .merge(protected)
        .merge(personalized)
        .merge(csrf::router())
        .merge(health::router(db))
}
