//! Signed session tokens.
//!
//! Access and refresh tokens share one wire format (an HS256 JWT) but are
//! signed with distinct secrets, so a token of one class never verifies as
//! the other.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Courtesy `iss` label. Never checked on validation.
pub const ISSUER: &str = "invoicely";

/// Access token lifetime: 15 minutes
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh token lifetime: 7 days
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const SIGNING_ALGORITHM: &str = "HS256";

/// Token class. Each class has its own secret and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim set carried inside a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Email, access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name, access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer label
    pub iss: String,
}

impl Claims {
    /// A claim set is live strictly before its expiry.
    pub fn is_live_at(&self, now: i64) -> bool {
        now < self.exp
    }
}

/// Errors that can occur while issuing or validating a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is empty")]
    EmptyToken,
    #[error("token is malformed")]
    MalformedToken,
    #[error("token declares an unexpected signing algorithm")]
    WrongAlgorithm,
    #[error("token signature does not match")]
    SignatureMismatch,
    #[error("token has expired")]
    Expired,
    #[error("failed to sign token")]
    InternalSigningFailure,
}

impl TokenError {
    /// True for conditions caused by the presented token rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, TokenError::InternalSigningFailure)
    }
}

// =============================================================================
// Codec
// =============================================================================

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Check a token's structure and return the algorithm it declares, without
/// verifying anything. Every segment must decode before the algorithm or
/// signature is looked at, so structural damage is always `MalformedToken`.
fn parse_unverified(token: &str) -> Result<String, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::MalformedToken);
    };

    let segment = |s: &str| URL_SAFE_NO_PAD.decode(s).map_err(|_| TokenError::MalformedToken);

    let header: RawHeader =
        serde_json::from_slice(&segment(header)?).map_err(|_| TokenError::MalformedToken)?;
    serde_json::from_slice::<Claims>(&segment(payload)?).map_err(|_| TokenError::MalformedToken)?;
    segment(signature)?;

    Ok(header.alg)
}

/// Sign a claim set with HS256 under the given key.
pub fn encode(claims: &Claims, key: &EncodingKey) -> Result<String, TokenError> {
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, key).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign token");
        TokenError::InternalSigningFailure
    })
}

/// Verify a token's structure, algorithm and signature, in that order, and
/// return its claim set. Expiry is left to the caller so it can be checked
/// against one clock reading.
pub fn decode(token: &str, key: &DecodingKey) -> Result<Claims, TokenError> {
    if parse_unverified(token)? != SIGNING_ALGORITHM {
        return Err(TokenError::WrongAlgorithm);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
        ErrorKind::InvalidAlgorithm => TokenError::WrongAlgorithm,
        _ => TokenError::MalformedToken,
    })?;

    Ok(data.claims)
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

// =============================================================================
// Configuration
// =============================================================================

/// Errors constructing a [`TokenConfig`].
#[derive(Debug, thiserror::Error)]
pub enum TokenConfigError {
    #[error("{0} token secret must not be empty")]
    EmptySecret(TokenClass),
    #[error("access and refresh token secrets must differ")]
    SharedSecret,
}

/// Secrets and lifetimes for both token classes. Immutable once built.
#[derive(Clone)]
pub struct TokenConfig {
    access_secret: Vec<u8>,
    access_ttl: i64,
    refresh_secret: Vec<u8>,
    refresh_ttl: i64,
}

impl TokenConfig {
    /// Create a configuration with the default lifetimes (15 minutes / 7 days).
    pub fn new(
        access_secret: impl Into<Vec<u8>>,
        refresh_secret: impl Into<Vec<u8>>,
    ) -> Result<Self, TokenConfigError> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();

        if access_secret.is_empty() {
            return Err(TokenConfigError::EmptySecret(TokenClass::Access));
        }
        if refresh_secret.is_empty() {
            return Err(TokenConfigError::EmptySecret(TokenClass::Refresh));
        }
        if access_secret == refresh_secret {
            return Err(TokenConfigError::SharedSecret);
        }

        Ok(Self {
            access_secret,
            access_ttl: ACCESS_TOKEN_TTL_SECS,
            refresh_secret,
            refresh_ttl: REFRESH_TOKEN_TTL_SECS,
        })
    }

    /// Override both lifetimes, in seconds. Zero or negative values yield
    /// tokens that are already expired when issued.
    pub fn with_ttls(mut self, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        self.access_ttl = access_ttl_secs;
        self.refresh_ttl = refresh_ttl_secs;
        self
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_secret", &"<redacted>")
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

// =============================================================================
// Service
// =============================================================================

/// A freshly signed token and its lifetime.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The encoded JWT
    pub token: String,
    /// Lifetime in seconds, used as the cookie Max-Age
    pub expires_in: i64,
}

#[derive(Clone)]
struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: i64,
}

impl ClassKeys {
    fn new(secret: &[u8], ttl: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

/// Issues and validates access and refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    access: ClassKeys,
    refresh: ClassKeys,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access: ClassKeys::new(&config.access_secret, config.access_ttl),
            refresh: ClassKeys::new(&config.refresh_secret, config.refresh_ttl),
        }
    }

    fn keys(&self, class: TokenClass) -> &ClassKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    /// Issue an access token carrying the subject's email and display name.
    pub fn issue_access_token(
        &self,
        subject_id: &str,
        email: &str,
        display_name: &str,
    ) -> Result<IssuedToken, TokenError> {
        self.issue(
            TokenClass::Access,
            subject_id,
            Some(email.to_string()),
            Some(display_name.to_string()),
        )
    }

    /// Issue a refresh token. Only the subject id is embedded.
    pub fn issue_refresh_token(&self, subject_id: &str) -> Result<IssuedToken, TokenError> {
        self.issue(TokenClass::Refresh, subject_id, None, None)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate(TokenClass::Access, token)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate(TokenClass::Refresh, token)
    }

    fn issue(
        &self,
        class: TokenClass,
        subject_id: &str,
        email: Option<String>,
        name: Option<String>,
    ) -> Result<IssuedToken, TokenError> {
        let keys = self.keys(class);
        let now = now_secs();
        let exp = now.saturating_add(keys.ttl);

        let claims = Claims {
            sub: subject_id.to_string(),
            email,
            name,
            iat: now,
            exp,
            iss: ISSUER.to_string(),
        };

        let token = encode(&claims, &keys.encoding)?;

        Ok(IssuedToken {
            token,
            expires_in: keys.ttl,
        })
    }

    fn validate(&self, class: TokenClass, token: &str) -> Result<Claims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::EmptyToken);
        }

        let claims = decode(token, &self.keys(class).decoding)?;

        if !claims.is_live_at(now_secs()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
