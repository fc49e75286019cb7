//! Paste record, request payloads, and response shapes.

use crate::constants::MAX_TTL_SECONDS;
use crate::error::AppError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// The persisted paste entity.
///
/// `ttl_seconds == 0` means no time-based expiry and `max_views == 0` means
/// unlimited views. `created_at` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteRecord {
    pub content: String,
    pub ttl_seconds: u64,
    pub max_views: u64,
    pub created_at: i64,
    pub views: u64,
}

impl PasteRecord {
    /// Create a fresh record with zero views.
    pub fn new(content: String, ttl_seconds: u64, max_views: u64, created_at: i64) -> Self {
        Self {
            content,
            ttl_seconds,
            max_views,
            created_at,
            views: 0,
        }
    }

    /// Absolute expiry instant in epoch milliseconds, if time-limited.
    pub fn expires_at_millis(&self) -> Option<i64> {
        if self.ttl_seconds == 0 {
            return None;
        }
        let ttl_ms = i64::try_from(self.ttl_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        Some(self.created_at.saturating_add(ttl_ms))
    }

    /// The expiry millisecond itself is still valid.
    pub fn is_time_expired(&self, now_millis: i64) -> bool {
        self.expires_at_millis()
            .is_some_and(|expires_at| now_millis > expires_at)
    }

    /// `views` has reached the configured cap.
    pub fn is_view_exhausted(&self) -> bool {
        self.max_views > 0 && self.views >= self.max_views
    }

    pub fn is_expired(&self, now_millis: i64) -> bool {
        self.is_time_expired(now_millis) || self.is_view_exhausted()
    }

    /// Views left before exhaustion, `None` when unlimited.
    pub fn remaining_views(&self) -> Option<u64> {
        (self.max_views > 0).then(|| self.max_views.saturating_sub(self.views))
    }

    /// Store-native expiry to attach on creation.
    pub fn store_ttl(&self) -> Option<Duration> {
        (self.ttl_seconds > 0).then(|| Duration::from_secs(self.ttl_seconds))
    }
}

/// Validated creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteDraft {
    pub content: String,
    pub ttl_seconds: u64,
    pub max_views: u64,
}

/// Request payload for creating a paste.
///
/// Fields stay loosely typed so that shape errors surface as validation
/// errors (and so batch creation can skip bad entries instead of rejecting
/// the whole body).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreatePasteRequest {
    pub content: Option<Value>,
    pub ttl_seconds: Option<Value>,
    pub max_views: Option<Value>,
}

/// Request payload for creating several pastes at once.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBatchRequest {
    pub pastes: Option<Value>,
}

impl CreateBatchRequest {
    /// Split the `pastes` array into create candidates.
    ///
    /// Entries that are not objects become empty candidates, which fail
    /// validation and are skipped, so they still count toward the batch size.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when `pastes` is missing or not an array.
    pub fn candidates(&self) -> Result<Vec<CreatePasteRequest>, AppError> {
        let entries = self.pastes.as_ref().and_then(Value::as_array).ok_or_else(|| {
            AppError::Validation("pastes must be a non-empty array".to_string())
        })?;
        Ok(entries
            .iter()
            .map(|entry| serde_json::from_value(entry.clone()).unwrap_or_default())
            .collect())
    }
}

/// Request payload for replacing paste content.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePasteRequest {
    pub content: Option<Value>,
}

/// Response for a created paste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedPaste {
    pub id: String,
    pub url: String,
    pub created_at: String,
}

/// Response for a batch create.
#[derive(Debug, Clone, Serialize)]
pub struct CreateBatchResponse {
    pub pastes: Vec<CreatedPaste>,
}

/// Response for a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteView {
    pub content: String,
    pub remaining_views: Option<u64>,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub is_expired: bool,
}

/// Response for a content update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatePasteResponse {
    pub message: String,
    pub content: String,
}

impl PasteView {
    /// Build fetch metadata for `record` as observed at `now_millis`.
    ///
    /// `record` is the post-increment state of a served fetch, so reaching
    /// the view cap does not mark it expired; only the TTL does.
    pub fn from_record(record: &PasteRecord, now_millis: i64) -> Self {
        Self {
            content: record.content.clone(),
            remaining_views: record.remaining_views(),
            expires_at: record.expires_at_millis().map(iso_millis),
            created_at: iso_millis(record.created_at),
            is_expired: record.is_time_expired(now_millis),
        }
    }
}

/// Format epoch milliseconds as an RFC 3339 UTC timestamp with milliseconds.
///
/// Instants outside the calendar range clamp to its nearest end.
pub fn iso_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or(if millis < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Validate paste content: a string that is non-empty after trimming.
///
/// # Returns
/// The trimmed content.
///
/// # Errors
/// Returns [`AppError::Validation`] when content is missing, not a string,
/// blank, or larger than `max_size` bytes.
pub fn validate_content(content: Option<&Value>, max_size: usize) -> Result<String, AppError> {
    let trimmed = content
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            AppError::Validation(
                "content is required and must be a non-empty string".to_string(),
            )
        })?;
    if trimmed.len() > max_size {
        return Err(AppError::Validation(format!(
            "Paste size exceeds maximum of {} bytes",
            max_size
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate an optional positive integer field.
///
/// Absent and `null` map to `0` (disabled).
///
/// # Errors
/// Returns [`AppError::Validation`] for non-integers and values below 1.
pub fn validate_optional_positive(field: &str, value: Option<&Value>) -> Result<u64, AppError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value
            .as_u64()
            .filter(|n| *n >= 1)
            .ok_or_else(|| AppError::Validation(format!("{} must be an integer ≥ 1", field))),
    }
}

impl PasteDraft {
    /// Validate a create request.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] describing the first invalid field.
    pub fn from_request(req: &CreatePasteRequest, max_size: usize) -> Result<Self, AppError> {
        let content = validate_content(req.content.as_ref(), max_size)?;
        let ttl_seconds = validate_optional_positive("ttl_seconds", req.ttl_seconds.as_ref())?;
        if ttl_seconds > MAX_TTL_SECONDS {
            return Err(AppError::Validation(format!(
                "ttl_seconds must be at most {}",
                MAX_TTL_SECONDS
            )));
        }
        Ok(Self {
            content,
            ttl_seconds,
            max_views: validate_optional_positive("max_views", req.max_views.as_ref())?,
        })
    }

    /// Turn the draft into a record created at `now_millis`.
    pub fn into_record(self, now_millis: i64) -> PasteRecord {
        PasteRecord::new(self.content, self.ttl_seconds, self.max_views, now_millis)
    }
}
