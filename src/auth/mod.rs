//! Session authentication for API routes.
//!
//! Access tokens travel in the `access_token` cookie (or, where enabled, an
//! `Authorization: Bearer` header). Interceptors validate them and attach an
//! [`Identity`] to the request; handlers read it back with the extractors.

mod cookie;
mod errors;
mod extractors;
mod middleware;
mod types;

pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, access_cookie, bearer_token, clear_access_cookie,
    clear_refresh_cookie, get_cookie, refresh_cookie, session_token,
};
pub use errors::{AuthError, CsrfRejection};
pub use extractors::{CurrentUser, MaybeUser};
pub use middleware::{AuthSettings, Interceptor, OptionalAuth, RequireAuth, intercept};
pub use types::Identity;
