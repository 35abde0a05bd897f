//! CSRF token issuance.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use super::error::{ApiError, ResultExt};
use crate::csrf::generate_token;

pub fn router() -> Router {
    Router::new().route("/csrf", get(issue_token))
}

#[derive(Serialize)]
struct CsrfTokenResponse {
    token: String,
}

/// Hand out a fresh token for the client to echo in `X-CSRF-Token`.
async fn issue_token() -> Result<Json<CsrfTokenResponse>, ApiError> {
    let token = generate_token().internal_err("Failed to generate CSRF token")?;
    Ok(Json(CsrfTokenResponse { token }))
}
