pub mod api;
pub mod auth;
pub mod cli;
pub mod csrf;
pub mod db;
pub mod jwt;
pub mod password;
pub mod session;

use api::create_api_router;
use auth::AuthSettings;
use axum::{
    Json, Router,
    extract::OriginalUri,
    http::{Method, StatusCode},
    response::IntoResponse,
};
use db::Database;
use jwt::{TokenConfig, TokenService};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secrets and lifetimes for access and refresh tokens
    pub tokens: TokenConfig,
    /// Where the auth interceptors look for the access token
    pub auth: AuthSettings,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
}

#[derive(Serialize)]
struct NotFoundResponse {
    error: &'static str,
    message: &'static str,
    path: String,
    method: String,
}

async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Not Found",
            message: "The requested API endpoint does not exist",
            path: uri.path().to_string(),
            method: method.to_string(),
        }),
    )
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let tokens = Arc::new(TokenService::new(&config.tokens));

    let api_router = create_api_router(
        config.db.clone(),
        tokens,
        config.auth,
        config.secure_cookies,
    );

    Router::new().nest("/api", api_router).fallback(not_found)
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
