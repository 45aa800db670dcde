//! Google ID token verification through the tokeninfo endpoint.
//!
//! Trust is delegated to Google: the token is sent to tokeninfo and the
//! returned claims are checked for audience, issuer and expiry. There is no
//! local signature check and no caching.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use super::allowlist::canonical_email;
use super::clock::Clock;
use super::types::Identity;

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Issuer values Google uses for ID tokens.
pub const ACCEPTED_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Error)]
pub enum GoogleVerifyError {
    /// Transport failure, timeout, or a non-success status from tokeninfo.
    #[error("token verification unavailable: {reason}")]
    VerificationUnavailable {
        /// HTTP status returned by tokeninfo, if a response was received.
        status: Option<u16>,
        reason: String,
    },

    #[error("token audience does not match the configured client id")]
    InvalidAudience,

    #[error("token issuer is not Google")]
    InvalidIssuer,

    #[error("token has expired")]
    TokenExpired,

    #[error("tokeninfo response is malformed: {0}")]
    MalformedAssertion(String),
}

impl GoogleVerifyError {
    /// True when Google answered and refused the token (4xx), as opposed to
    /// being unreachable or failing server-side.
    pub fn is_rejected_by_provider(&self) -> bool {
        matches!(
            self,
            GoogleVerifyError::VerificationUnavailable { status: Some(code), .. }
                if (400..500).contains(code)
        )
    }
}

/// Claims returned by tokeninfo. Google encodes most values as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalAssertion {
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub email_verified: bool,
    #[serde(default, deserialize_with = "deserialize_epoch")]
    pub exp: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Accept `true` or `"true"`; anything else is false.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => s == "true",
        Some(Flag::Other(_)) | None => false,
    })
}

/// Accept epoch seconds as a number or a numeric string.
fn deserialize_epoch<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Epoch {
        Int(i64),
        Text(String),
    }

    match Option::<Epoch>::deserialize(deserializer)? {
        Some(Epoch::Int(secs)) => Ok(Some(secs)),
        Some(Epoch::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid exp value: {s:?}"))),
        None => Ok(None),
    }
}

/// Check a tokeninfo response against the expected client id and the
/// current time, in order: audience, issuer, expiry.
pub fn validate_assertion(
    assertion: ExternalAssertion,
    client_id: &str,
    now_secs: i64,
) -> Result<Identity, GoogleVerifyError> {
    if assertion.aud.as_deref() != Some(client_id) {
        return Err(GoogleVerifyError::InvalidAudience);
    }

    match assertion.iss.as_deref() {
        Some(iss) if ACCEPTED_ISSUERS.contains(&iss) => {}
        _ => return Err(GoogleVerifyError::InvalidIssuer),
    }

    let exp = assertion
        .exp
        .ok_or_else(|| GoogleVerifyError::MalformedAssertion("missing exp".to_string()))?;
    if exp <= now_secs {
        return Err(GoogleVerifyError::TokenExpired);
    }

    let email = assertion
        .email
        .as_deref()
        .map(canonical_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| GoogleVerifyError::MalformedAssertion("missing email".to_string()))?;

    Ok(Identity {
        email,
        name: assertion.name.filter(|n| !n.trim().is_empty()),
        avatar_url: assertion.picture,
        email_verified: assertion.email_verified,
    })
}

/// Exchanges a third-party ID token for a verified identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<Identity, GoogleVerifyError>;
}

/// Verifier backed by Google's tokeninfo endpoint.
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    tokeninfo_url: String,
    client_id: String,
    clock: Arc<dyn Clock>,
}

impl GoogleTokenVerifier {
    /// Build a verifier whose outbound call is bounded by `timeout`.
    pub fn new(
        tokeninfo_url: impl Into<String>,
        client_id: impl Into<String>,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            tokeninfo_url: tokeninfo_url.into(),
            client_id: client_id.into(),
            clock,
        })
    }

    async fn fetch_assertion(&self, id_token: &str) -> Result<ExternalAssertion, GoogleVerifyError> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| GoogleVerifyError::VerificationUnavailable {
                status: None,
                reason: if e.is_timeout() {
                    "tokeninfo request timed out".to_string()
                } else {
                    format!("tokeninfo request failed: {}", e)
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GoogleVerifyError::VerificationUnavailable {
                status: Some(status.as_u16()),
                reason: format!("tokeninfo returned {}", status),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GoogleVerifyError::VerificationUnavailable {
                status: Some(status.as_u16()),
                reason: format!("failed to read tokeninfo body: {}", e),
            })?;

        serde_json::from_slice(&body).map_err(|e| GoogleVerifyError::MalformedAssertion(e.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<Identity, GoogleVerifyError> {
        let assertion = self.fetch_assertion(id_token).await?;
        let identity = validate_assertion(assertion, &self.client_id, self.clock.now().timestamp())?;
        tracing::debug!("Google token verified for: {}", identity.email);
        Ok(identity)
    }
}
