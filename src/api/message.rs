//! Public greeting, personalized when the caller is signed in.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::auth::MaybeUser;

pub const ANONYMOUS_GREETING: &str = "Hello, from the Rust World!";

/// Routes that expect `OptionalAuth` to be layered on top.
pub fn router() -> Router {
    Router::new().route("/message", get(get_message))
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn get_message(MaybeUser(identity): MaybeUser) -> Json<MessageResponse> {
    let message = match identity.as_ref().and_then(|i| i.display_name()) {
        Some(name) if !name.is_empty() => format!("Hello, {}!", name),
        _ => ANONYMOUS_GREETING.to_string(),
    };
    Json(MessageResponse { message })
}
