//! Session token creation and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::types::{Claims, Identity, LoginMethod};
use crate::config::GateConfig;

/// Session tokens are valid for exactly this long and are never renewed.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no bearer credential presented")]
    MissingCredential,

    #[error("session token is invalid")]
    InvalidCredential,

    #[error("session token has expired")]
    CredentialExpired,

    #[error("failed to sign session token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Create a new session token for an identity that has already been authorized.
pub fn create_token(
    config: &GateConfig,
    identity: &Identity,
    login_method: LoginMethod,
    now: DateTime<Utc>,
) -> Result<String, CredentialError> {
    let exp = now + Duration::hours(SESSION_TTL_HOURS);

    let claims = Claims {
        sub: identity.email.clone(),
        email: identity.email.clone(),
        name: identity.name.clone(),
        login_method,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(CredentialError::Signing)
}

/// Validate a session token's signature and expiry and return its claims.
///
/// Expiry is compared against `now` with no leeway: a token is accepted up
/// to and including its `exp` second.
pub fn validate_token(
    config: &GateConfig,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Claims, CredentialError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("Session token rejected: {}", e);
        CredentialError::InvalidCredential
    })?;

    if now.timestamp() > token_data.claims.exp {
        return Err(CredentialError::CredentialExpired);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::allowlist::Allowlist;

    fn test_config() -> GateConfig {
        GateConfig::new(
            "test-secret-key-for-testing-only",
            "test-client",
            Allowlist::parse("test@example.com"),
        )
    }

    fn identity() -> Identity {
        Identity {
            email: "test@example.com".to_string(),
            name: Some("Test User".to_string()),
            avatar_url: None,
            email_verified: true,
        }
    }

    fn issued_at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_create_and_validate_token() {
        let config = test_config();
        let token = create_token(&config, &identity(), LoginMethod::Google, issued_at())
            .expect("should create token");

        let claims = validate_token(&config, &token, issued_at()).expect("should validate token");
        assert_eq!(claims.sub, "test@example.com");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.name, Some("Test User".to_string()));
        assert_eq!(claims.login_method, LoginMethod::Google);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_token_valid_until_expiry_second() {
        let config = test_config();
        let token = create_token(&config, &identity(), LoginMethod::Email, issued_at()).unwrap();

        let last_valid = issued_at() + Duration::hours(SESSION_TTL_HOURS);
        assert!(validate_token(&config, &token, last_valid).is_ok());

        let one_second_late = last_valid + Duration::seconds(1);
        assert!(matches!(
            validate_token(&config, &token, one_second_late),
            Err(CredentialError::CredentialExpired)
        ));
    }

    #[test]
    fn test_expiry_follows_injected_clock() {
        let config = test_config();
        // Issued and expired long before the wall clock's present.
        let long_ago = DateTime::from_timestamp(1_000_000_000, 0).unwrap();
        let token = create_token(&config, &identity(), LoginMethod::Email, long_ago).unwrap();

        assert!(validate_token(&config, &token, long_ago + Duration::hours(1)).is_ok());
        assert!(matches!(
            validate_token(&config, &token, Utc::now()),
            Err(CredentialError::CredentialExpired)
        ));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = test_config();
        let result = validate_token(&config, "invalid-token", issued_at());
        assert!(matches!(result, Err(CredentialError::InvalidCredential)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config();
        let token = create_token(&config, &identity(), LoginMethod::Email, issued_at()).unwrap();

        let mut wrong_config = config;
        wrong_config.jwt_secret = "wrong-secret".to_string();

        let result = validate_token(&wrong_config, &token, issued_at());
        assert!(matches!(result, Err(CredentialError::InvalidCredential)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let config = test_config();
        let token = create_token(&config, &identity(), LoginMethod::Email, issued_at()).unwrap();

        let payload_start = token.find('.').unwrap() + 1;
        let target = payload_start + 5;
        let mut bytes = token.into_bytes();
        bytes[target] = if bytes[target] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let result = validate_token(&config, &tampered, issued_at());
        assert!(matches!(result, Err(CredentialError::InvalidCredential)));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let config = test_config();
        let claims = Claims {
            sub: "test@example.com".to_string(),
            email: "test@example.com".to_string(),
            name: None,
            login_method: LoginMethod::Email,
            iat: issued_at().timestamp(),
            exp: issued_at().timestamp() + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let result = validate_token(&config, &token, issued_at());
        assert!(matches!(result, Err(CredentialError::InvalidCredential)));
    }
}
