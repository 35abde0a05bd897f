//! Credential flow endpoints.
//!
//! - POST `/auth/register` - Create an account and start a session
//! - POST `/auth/login` - Check credentials and start a session
//! - POST `/auth/refresh` - Exchange the refresh cookie for a new access token
//! - POST `/auth/logout` - Clear both session cookies (authenticated, CSRF)
//! - GET `/auth/me` - Profile of the authenticated user

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderName, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ApiError, ResultExt};
use crate::auth::{
    CurrentUser, REFRESH_COOKIE_NAME, access_cookie, clear_access_cookie, clear_refresh_cookie,
    get_cookie, refresh_cookie,
};
use crate::db::{Database, NewUser, User, is_unique_violation};
use crate::jwt::TokenService;
use crate::password::{hash_password, verify_password};
use crate::session::{RefreshError, Session, refresh_access_token, start_session};

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub secure_cookies: bool,
}

/// Routes reachable without a session.
pub fn public_router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .with_state(state)
}

/// Routes that expect `RequireAuth` (and the CSRF guard) to be layered on top.
pub fn protected_router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct UserResponse {
    id: String,
    email: String,
    name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Serialize)]
struct SessionResponse {
    user: UserResponse,
    token: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    token: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Both cookies share the Set-Cookie header name, so they must be appended.
fn session_cookies(session: &Session, secure: bool) -> AppendHeaders<[(HeaderName, String); 2]> {
    AppendHeaders([
        (
            SET_COOKIE,
            access_cookie(&session.access.token, session.access.expires_in, secure),
        ),
        (
            SET_COOKIE,
            refresh_cookie(&session.refresh.token, session.refresh.expires_in, secure),
        ),
    ])
}

fn body_error(rejection: JsonRejection) -> ApiError {
    debug!(error = %rejection, "Rejected request body");
    ApiError::bad_request("invalid request body")
}

async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(body_error)?;

    let email = payload.email.trim();
    let name = payload.name.trim();

    if email.is_empty() || payload.password.is_empty() || name.is_empty() {
        return Err(ApiError::bad_request(
            "email, password, and name are required",
        ));
    }

    if !email.contains('@') {
        return Err(ApiError::bad_request("invalid email address"));
    }

    let password_hash =
        hash_password(&payload.password).internal_err("Failed to hash password")?;

    let id = uuid::Uuid::new_v4().to_string();
    let new_user = NewUser {
        id: &id,
        email,
        name,
        password_hash: &password_hash,
    };

    match state.db.users().create(&new_user).await {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("email is already registered"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    }

    let session = start_session(&state.tokens, &id, email, name)?;
    info!(subject = %id, "Registered user");

    Ok((
        StatusCode::CREATED,
        session_cookies(&session, state.secure_cookies),
        Json(SessionResponse {
            user: UserResponse {
                id,
                email: email.to_string(),
                name: name.to_string(),
            },
            token: session.access.token,
        }),
    ))
}

async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(body_error)?;

    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    // Unknown email and wrong password must be indistinguishable
    let invalid = || ApiError::unauthorized("invalid email or password");

    let user = state
        .db
        .users()
        .get_by_email(email)
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(invalid)?;

    let valid = verify_password(&payload.password, &user.password_hash)
        .internal_err("Failed to verify password")?;
    if !valid {
        debug!(subject = %user.id, "Password mismatch");
        return Err(invalid());
    }

    let session = start_session(&state.tokens, &user.id, &user.email, &user.name)?;
    info!(subject = %user.id, "User logged in");

    Ok((
        session_cookies(&session, state.secure_cookies),
        Json(SessionResponse {
            user: user.into(),
            token: session.access.token,
        }),
    ))
}

/// Issue a new access token from the refresh cookie. The refresh token itself
/// is left untouched.
async fn refresh(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("missing refresh token"))?;

    let (user, access) = refresh_access_token(&state.tokens, &state.db.users(), refresh_token)
        .await
        .map_err(|e| match e {
            RefreshError::InvalidToken(kind) => {
                debug!(error = %kind, "Rejected refresh token");
                ApiError::unauthorized("invalid or expired refresh token")
            }
            RefreshError::UnknownSubject => {
                ApiError::unauthorized("invalid or expired refresh token")
            }
            RefreshError::Storage(e) => ApiError::db_error("Failed to look up user", e),
            RefreshError::Signing(e) => ApiError::from(e),
        })?;

    debug!(subject = %user.id, "Refreshed access token");

    Ok((
        [(
            SET_COOKIE,
            access_cookie(&access.token, access.expires_in, state.secure_cookies),
        )],
        Json(RefreshResponse {
            token: access.token,
        }),
    ))
}

async fn logout(
    State(state): State<AuthState>,
    CurrentUser(identity): CurrentUser,
) -> impl IntoResponse {
    info!(subject = %identity.subject_id, "User logged out");
    (
        AppendHeaders([
            (SET_COOKIE, clear_access_cookie(state.secure_cookies)),
            (SET_COOKIE, clear_refresh_cookie(state.secure_cookies)),
        ]),
        Json(MessageResponse {
            message: "logged out successfully",
        }),
    )
}

async fn me(
    State(state): State<AuthState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .users()
        .get_by_id(&identity.subject_id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(user.into()))
}
