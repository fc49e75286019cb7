//! Application error types for core storage and domain logic.
use crate::store::StoreError;
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad input shape or values; user-correctable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Absent, time-expired, or view-exhausted paste. These are never
    /// distinguished for callers.
    #[error("Not found")]
    NotFound,

    /// Mutation attempted on an expired paste.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Persisted payload could not be parsed as structured data at all.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::StoreUnavailable(value.to_string())
    }
}

impl AppError {
    /// Whether the error should be reported to callers as a missing paste.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound | Self::MalformedRecord(_))
    }
}
