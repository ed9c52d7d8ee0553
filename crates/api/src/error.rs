//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use workflow::{SessionError, WorkflowError};

use crate::render::RenderError;

/// Errors that end a request with an error status instead of a redirect.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client, including a failed CSRF check.
    BadRequest(String),
    /// A page could not be rendered.
    Render(RenderError),
    /// The session store failed.
    Session(SessionError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Render(err) => {
                tracing::error!(error = %err, "page rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::Session(err) => {
                tracing::error!(error = %err, "session store failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError::Render(err)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Session(err)
    }
}

/// Where the client is sent after a failed workflow step, and the error
/// flash shown there.
pub fn redirect_for(err: &WorkflowError) -> (&'static str, &'static str) {
    match err {
        WorkflowError::InvalidInput(_) => {
            ("/check-availability", "Can't parse the submitted dates or vehicle")
        }
        WorkflowError::NoAvailability(_) => (
            "/check-availability",
            "No available vehicles for specified dates",
        ),
        WorkflowError::DraftMissing { .. } => ("/", "Can't get rent from session"),
        WorkflowError::ItemNotFound(_) => ("/", "Can't get model from database"),
        WorkflowError::CommitFailed { .. } => ("/", "Can't save your rent, please try again"),
        WorkflowError::BackendUnavailable(_) | WorkflowError::Session(_) => {
            ("/", "Something went wrong, please try again")
        }
    }
}
