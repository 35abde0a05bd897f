//! Session issuance and the refresh flow.
//!
//! Refresh tokens carry only the subject id, so refreshing looks the subject
//! up again to recover the email and display name for the new access token.
//! Refresh tokens are not rotated or revoked; one stays usable until it expires.

use crate::db::{User, UserStore};
use crate::jwt::{IssuedToken, TokenError, TokenService};

/// Access and refresh tokens issued together at login or registration.
#[derive(Debug, Clone)]
pub struct Session {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Issue a new access + refresh pair for an authenticated user.
pub fn start_session(
    tokens: &TokenService,
    subject_id: &str,
    email: &str,
    display_name: &str,
) -> Result<Session, TokenError> {
    let access = tokens.issue_access_token(subject_id, email, display_name)?;
    let refresh = tokens.issue_refresh_token(subject_id)?;
    Ok(Session { access, refresh })
}

/// Errors from the refresh flow.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh token rejected: {0}")]
    InvalidToken(TokenError),
    #[error("refresh token subject no longer exists")]
    UnknownSubject,
    #[error("failed to look up subject: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("failed to issue access token: {0}")]
    Signing(TokenError),
}

/// Exchange a refresh token for a new access token.
pub async fn refresh_access_token(
    tokens: &TokenService,
    users: &UserStore,
    refresh_token: &str,
) -> Result<(User, IssuedToken), RefreshError> {
    let claims = tokens
        .validate_refresh_token(refresh_token)
        .map_err(RefreshError::InvalidToken)?;

    let user = users
        .get_by_id(&claims.sub)
        .await?
        .ok_or(RefreshError::UnknownSubject)?;

    let access = tokens
        .issue_access_token(&user.id, &user.email, &user.name)
        .map_err(RefreshError::Signing)?;

    Ok((user, access))
}
