#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use invoicely::{
    ServerConfig,
    auth::AuthSettings,
    create_app,
    db::{Database, NewUser},
    jwt::{TokenConfig, TokenService},
    password::hash_password,
};
use tower::ServiceExt;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    /// Built from the same secrets as the app, for minting tokens directly.
    pub tokens: TokenService,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(AuthSettings::default()).await
    }

    pub async fn with_settings(auth: AuthSettings) -> Self {
        let tokens = TokenConfig::new(ACCESS_SECRET, REFRESH_SECRET).expect("Invalid secrets");
        Self::with_config(tokens, auth).await
    }

    pub async fn with_config(tokens: TokenConfig, auth: AuthSettings) -> Self {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let service = TokenService::new(&tokens);
        let config = ServerConfig {
            db: db.clone(),
            tokens,
            auth,
            secure_cookies: false,
        };
        Self {
            app: create_app(&config),
            db,
            tokens: service,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Insert a user with the given password and return its id.
    pub async fn create_user(&self, email: &str, name: &str, password: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let hash = hash_password(password).unwrap();
        self.db
            .users()
            .create(&NewUser {
                id: &id,
                email,
                name,
                password_hash: &hash,
            })
            .await
            .unwrap()
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Value of the named cookie from a list of Set-Cookie headers.
pub fn cookie_value(cookies: &[String], name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    cookies.iter().find_map(|c| {
        c.strip_prefix(&prefix)
            .map(|rest| rest.split(';').next().unwrap_or("").to_string())
    })
}

/// Check if cookies contain a token being cleared (Max-Age=0)
pub fn has_cleared_cookie(cookies: &[String], cookie_name: &str) -> bool {
    let prefix = format!("{}=;", cookie_name);
    cookies
        .iter()
        .any(|c| c.starts_with(&prefix) && c.contains("Max-Age=0"))
}
