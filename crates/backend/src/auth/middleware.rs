//! Authentication middleware layer for protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::AppState;

use super::jwt::{self, CredentialError};
use super::types::AuthUser;

/// Middleware function that requires a valid bearer session token.
///
/// On success the [`AuthUser`] is inserted into request extensions for the
/// handler. Use with `axum::middleware::from_fn_with_state`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match extract_auth_user(request.headers(), &state) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!("Rejected {} {}: {}", request.method(), request.uri().path(), err);
            ApiError::from(err).into_response()
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, CredentialError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(CredentialError::MissingCredential)
}

/// Extract and validate the user from request headers.
pub fn extract_auth_user(headers: &HeaderMap, state: &AppState) -> Result<AuthUser, CredentialError> {
    let token = extract_bearer(headers)?;
    let claims = jwt::validate_token(&state.config, token, state.clock.now())?;
    Ok(claims.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_or_malformed_prefix() {
        assert!(matches!(
            extract_bearer(&HeaderMap::new()),
            Err(CredentialError::MissingCredential)
        ));
        for value in ["abc.def.ghi", "Basic dXNlcjpwdw==", "bearer abc", "Bearer ", "Bearer    "] {
            assert!(
                matches!(extract_bearer(&headers(value)), Err(CredentialError::MissingCredential)),
                "{value:?} should be rejected"
            );
        }
    }
}
