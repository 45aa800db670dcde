//! Auth-related types.

use serde::{Deserialize, Serialize};

// Re-export shared types for convenience
pub use flipgate_types::{LoginMethod, SessionUser, VerifiedUser};

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (canonical email)
    pub sub: String,
    pub email: String,
    /// Display name at the time of login
    pub name: Option<String>,
    #[serde(rename = "loginMethod")]
    pub login_method: LoginMethod,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// An identity that has already passed the allowlist or local credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Canonical (trimmed, lowercased) email
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
}

/// Validated user from a session token.
///
/// Only produced by the credential verifier, so holding one means the
/// bearer token was valid for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
    pub name: Option<String>,
    pub login_method: LoginMethod,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            email: claims.sub,
            name: claims.name,
            login_method: claims.login_method,
        }
    }
}

impl AuthUser {
    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }

    pub fn verified_user(&self) -> VerifiedUser {
        VerifiedUser {
            email: self.email.clone(),
            name: self.name.clone(),
            login_method: self.login_method,
        }
    }
}
