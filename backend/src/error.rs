//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use crate::polls::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Application-level error types
///
/// Every failure a request can hit is one of these variants. The `Display`
/// text is what the client sees, so store details never appear in it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Vote choice was not exactly "yes" or "no"
    #[error("Invalid choice")]
    InvalidChoice,

    /// A required poll field was missing or invalid
    #[error("Missing required fields")]
    MissingFields(String),

    /// Request body was not the expected JSON shape
    #[error("Invalid request body")]
    InvalidBody(String),

    /// Admin credential was absent or wrong
    #[error("Unauthorized")]
    Unauthorized,

    /// No poll with the given ID
    #[error("Vote not found")]
    PollNotFound(String),

    /// Poll exists but its voting window has ended
    #[error("Voting period has ended")]
    VotingClosed(String),

    /// Store call failed; `context` is the client-facing message
    #[error("{context}")]
    Store {
        /// Generic description of the failed operation
        context: &'static str,
        /// Underlying store error (logged, never returned)
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// Wrap a store error with a generic client-facing message
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Store { context, source }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidChoice => StatusCode::BAD_REQUEST,
            AppError::MissingFields(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::PollNotFound(_) => StatusCode::NOT_FOUND,
            AppError::VotingClosed(_) => StatusCode::BAD_REQUEST,
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            AppError::Store { context, source } => error!(error = %source, "{}", context),
            other => debug!(error = ?other, "Request rejected"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Error for the poll listing endpoint, rendered as `{"error": …}`
#[derive(Debug)]
pub struct ListError(pub AppError);

impl From<AppError> for ListError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        self.0.log();
        let status = self.0.status();

        let body = Json(json!({
            "error": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidChoice.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::MissingFields("title".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::PollNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::VotingClosed("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_store_error_is_not_leaked() {
        let error = AppError::store("Failed to submit vote")(StoreError::Migration(
            "no such table: polls".to_string(),
        ));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to submit vote");
        assert!(!body.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn test_list_error_body_has_no_success_flag() {
        let error = ListError(AppError::store("Failed to fetch votes")(
            StoreError::Migration("boom".to_string()),
        ));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "error": "Failed to fetch votes" }));
    }
}
