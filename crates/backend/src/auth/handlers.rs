//! Authentication HTTP handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use flipgate_types::{
    AllowlistSummary, CheckEmailRequest, CheckEmailResponse, GoogleAuthRequest,
    GoogleAuthResponse, GoogleUser, LoginRequest, LoginResponse, LoginUser, VerifyResponse,
};

use crate::error::{ApiError, ApiResult, MSG_WRONG_PASSWORD};
use crate::AppState;

use super::allowlist::canonical_email;
use super::jwt;
use super::types::{AuthUser, LoginMethod};

/// Treat absent and blank fields alike.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Email/password login against the local credential table.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    let (Some(email), Some(password)) = (required(req.email), required(req.password)) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };
    let email = canonical_email(&email);

    tracing::info!("Login attempt for: {}", email);

    let Some(record) = state.config.local_users.authenticate(&email, &password) else {
        tracing::warn!("Failed login for: {}", email);
        return Err(ApiError::unauthorized(MSG_WRONG_PASSWORD));
    };

    let identity = record.identity();
    let token = jwt::create_token(&state.config, &identity, LoginMethod::Email, state.clock.now())?;

    tracing::info!("Login successful for: {}", identity.email);

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: LoginUser {
            id: record.id,
            email: identity.email,
            name: record.name.clone(),
        },
    }))
}

/// Google sign-in: verify the ID token, then require the allowlist.
pub async fn google_auth(
    State(state): State<AppState>,
    payload: Result<Json<GoogleAuthRequest>, JsonRejection>,
) -> ApiResult<Json<GoogleAuthResponse>> {
    let Json(req) = payload?;
    let id_token =
        required(req.id_token).ok_or_else(|| ApiError::bad_request("Google ID token required"))?;

    let mut identity = state.verifier.verify(&id_token).await.map_err(|e| {
        tracing::warn!("Google token verification failed: {}", e);
        ApiError::from(e)
    })?;

    let allowlist = &state.config.allowlist;
    if !allowlist.is_allowed(&identity.email) {
        tracing::warn!("Access denied for: {}", identity.email);
        return Err(ApiError::forbidden(identity.email));
    }

    if identity.name.is_none() {
        identity.name = allowlist.display_name(&identity.email).map(str::to_string);
    }

    let token = jwt::create_token(&state.config, &identity, LoginMethod::Google, state.clock.now())?;

    tracing::info!("Access granted for: {}", identity.email);

    Ok(Json(GoogleAuthResponse {
        success: true,
        token,
        user: GoogleUser {
            email: identity.email,
            name: identity.name,
            avatar: identity.avatar_url,
            verified: identity.email_verified,
        },
    }))
}

/// Report whether an address is allowlisted, without issuing a token.
pub async fn check_email(
    State(state): State<AppState>,
    payload: Result<Json<CheckEmailRequest>, JsonRejection>,
) -> ApiResult<Json<CheckEmailResponse>> {
    let Json(req) = payload?;
    let email = required(req.email).ok_or_else(|| ApiError::bad_request("Email required"))?;
    let email = canonical_email(&email);

    let allowlist = &state.config.allowlist;
    let response = if allowlist.is_allowed(&email) {
        tracing::info!("Email check passed: {}", email);
        CheckEmailResponse {
            allowed: true,
            name: Some(allowlist.display_name_for(&email)),
            email,
            message: None,
        }
    } else {
        tracing::info!("Email check failed: {}", email);
        CheckEmailResponse {
            allowed: false,
            email,
            name: None,
            message: Some("Email not in whitelist".to_string()),
        }
    };

    Ok(Json(response))
}

/// Diagnostic summary of the allowlist. Does not reveal any address.
pub async fn allowlist_summary(State(state): State<AppState>) -> Json<AllowlistSummary> {
    Json(AllowlistSummary {
        message: "Email whitelist check endpoint".to_string(),
        total_allowed: state.config.allowlist.len(),
    })
}

/// Echo the identity carried by the bearer token.
pub async fn verify(Extension(user): Extension<AuthUser>) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        message: "Token verified".to_string(),
        user: user.verified_user(),
    })
}
