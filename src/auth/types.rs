//! Request-scoped identity.

use crate::jwt::Claims;

/// The authenticated principal attached to one in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    /// Full claim set from the validated access token
    pub claims: Claims,
}

impl Identity {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub.clone(),
            email: claims.email.clone().unwrap_or_default(),
            claims,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.claims.name.as_deref()
    }
}
