use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::db::Database;

pub fn router(db: Database) -> Router {
    Router::new().route("/health", get(health)).with_state(db)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health(State(db): State<Database>) -> (StatusCode, Json<HealthResponse>) {
    match db.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}
