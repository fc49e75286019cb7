//! HTTP error mapping for API handlers.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use ttlpaste_core::AppError;

const NOT_FOUND_MESSAGE: &str = "Paste not found or expired";
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Error returned by JSON API handlers.
///
/// Always rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum HttpError {
    App(AppError),
    /// The request body could not be read as the expected JSON.
    Rejected { status: StatusCode, message: String },
}

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl HttpError {
    /// Status code and client-facing message.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::App(AppError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::App(AppError::NotFound) => (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string()),
            Self::App(AppError::MalformedRecord(reason)) => {
                tracing::warn!("Malformed paste record: {}", reason);
                (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string())
            }
            Self::App(AppError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            Self::App(AppError::StoreUnavailable(msg)) => {
                tracing::error!("Store error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
            Self::Rejected { status, message } => (*status, message.clone()),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}
