//! Admin authentication
//!
//! Middleware guarding privileged routes with the pre-shared `x-admin-key`
//! header. It runs before the body is read, so unauthorized requests never
//! reach validation or the store.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Header carrying the admin credential
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Reject the request with 403 unless it carries the configured admin key
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match presented {
        Some(key) if state.admin_key_matches(key) => Ok(next.run(request).await),
        Some(_) => {
            warn!(uri = %request.uri(), "Rejected request with incorrect admin key");
            Err(AppError::Unauthorized)
        }
        None => {
            warn!(uri = %request.uri(), "Rejected request without admin key");
            Err(AppError::Unauthorized)
        }
    }
}
