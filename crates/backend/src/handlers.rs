use axum::{extract::State, http::StatusCode, Extension, Json};
use flipgate_types::FlipbookUrlResponse;

use crate::auth::types::AuthUser;
use crate::error::ApiError;
use crate::AppState;

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Release the flipbook URL to the verified caller.
pub async fn flipbook_url(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<FlipbookUrlResponse> {
    Json(state.flipbook.resolve(&user))
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
