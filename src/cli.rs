//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::AuthSettings;
use crate::db::Database;
use crate::jwt::TokenConfig;
use clap::Parser;
use tracing::{error, info, warn};

/// Used when `JWT_ACCESS_SECRET` is unset. Never deploy with this.
const DEV_ACCESS_SECRET: &str = "invoicely-dev-access-secret-change-me";

/// Used when `JWT_REFRESH_SECRET` is unset. Never deploy with this.
const DEV_REFRESH_SECRET: &str = "invoicely-dev-refresh-secret-change-me";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "invoicely",
    about = "Account and session API: password login, JWT cookies, refresh and CSRF"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "invoicely.db")]
    pub database: String,

    /// Secret used to sign access tokens
    #[arg(long, env = "JWT_ACCESS_SECRET", hide_env_values = true)]
    pub jwt_access_secret: Option<String>,

    /// Secret used to sign refresh tokens (must differ from the access secret)
    #[arg(long, env = "JWT_REFRESH_SECRET", hide_env_values = true)]
    pub jwt_refresh_secret: Option<String>,

    /// Set the Secure flag on session cookies (enable behind HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Only accept the access token from its cookie, ignore `Authorization: Bearer`
    #[arg(long)]
    pub no_bearer: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

fn secret_or_default(value: Option<&str>, var: &str, default: &str) -> String {
    match value {
        Some(secret) if !secret.is_empty() => secret.to_string(),
        _ => {
            warn!(
                "{} is not set, using an insecure development default. Set it before deploying",
                var
            );
            default.to_string()
        }
    }
}

/// Build the token configuration from the arguments.
/// Returns None and logs an error if the secrets are unusable.
pub fn load_token_config(args: &Args) -> Option<TokenConfig> {
    let access = secret_or_default(
        args.jwt_access_secret.as_deref(),
        "JWT_ACCESS_SECRET",
        DEV_ACCESS_SECRET,
    );
    let refresh = secret_or_default(
        args.jwt_refresh_secret.as_deref(),
        "JWT_REFRESH_SECRET",
        DEV_REFRESH_SECRET,
    );

    match TokenConfig::new(access, refresh) {
        Ok(config) => Some(config),
        Err(e) => {
            error!(error = %e, "Invalid token secrets");
            None
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, tokens: TokenConfig) -> ServerConfig {
    ServerConfig {
        db,
        tokens,
        auth: AuthSettings {
            bearer_fallback: !args.no_bearer,
        },
        secure_cookies: args.secure_cookies,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
