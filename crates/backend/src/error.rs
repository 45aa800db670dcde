//! Unified error handling for the gate API.
//!
//! Component errors are converted here by matching on their variants, and
//! every error renders as an [`ErrorBody`] with a user-safe message.
//! Internal detail is logged, never returned.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flipgate_types::ErrorBody;
use thiserror::Error;

use crate::auth::google::GoogleVerifyError;
use crate::auth::jwt::CredentialError;

pub const MSG_AUTH_REQUIRED: &str = "Authentication required. Please login again.";
pub const MSG_SESSION_EXPIRED: &str = "Login session expired. Please sign in again.";
pub const MSG_INVALID_LOGIN: &str = "Invalid login credentials.";
pub const MSG_WRONG_PASSWORD: &str = "Incorrect email or password.";
pub const MSG_NOT_ALLOWLISTED: &str =
    "Access denied. Your email is not authorized to access this content.";
pub const MSG_PROVIDER_UNAVAILABLE: &str =
    "Google sign-in is temporarily unavailable. Please try again.";
pub const MSG_METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const MSG_INTERNAL: &str = "Authentication failed. Please try again.";

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or empty required field
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Body was not valid JSON for the endpoint
    #[error("Invalid JSON: {0}")]
    JsonParse(#[from] JsonRejection),

    /// Bad local credentials, bad session token, or failed external verification
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not on the allowlist
    #[error("Forbidden: {email}")]
    Forbidden { email: String },

    /// External identity provider unreachable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(email: impl Into<String>) -> Self {
        ApiError::Forbidden {
            email: email.into(),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::MissingCredential | CredentialError::InvalidCredential => {
                ApiError::unauthorized(MSG_AUTH_REQUIRED)
            }
            CredentialError::CredentialExpired => ApiError::unauthorized(MSG_SESSION_EXPIRED),
            CredentialError::Signing(e) => {
                ApiError::Internal(anyhow::Error::new(e).context("failed to sign session token"))
            }
        }
    }
}

impl From<GoogleVerifyError> for ApiError {
    fn from(err: GoogleVerifyError) -> Self {
        if err.is_rejected_by_provider() {
            return ApiError::unauthorized(MSG_INVALID_LOGIN);
        }
        match err {
            GoogleVerifyError::VerificationUnavailable { .. } => {
                ApiError::ServiceUnavailable(MSG_PROVIDER_UNAVAILABLE.to_string())
            }
            GoogleVerifyError::TokenExpired => ApiError::unauthorized(MSG_SESSION_EXPIRED),
            GoogleVerifyError::InvalidAudience
            | GoogleVerifyError::InvalidIssuer
            | GoogleVerifyError::MalformedAssertion(_) => ApiError::unauthorized(MSG_INVALID_LOGIN),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
            ApiError::JsonParse(e) => {
                tracing::warn!("JSON parse error: {}", e.body_text());
                (StatusCode::BAD_REQUEST, ErrorBody::new("Invalid JSON body"))
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorBody::new(msg)),
            ApiError::Forbidden { email } => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    message: MSG_NOT_ALLOWLISTED.to_string(),
                    email: Some(email),
                },
            ),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorBody::new(msg))
            }
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorBody::new(MSG_METHOD_NOT_ALLOWED),
            ),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(MSG_INTERNAL))
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
