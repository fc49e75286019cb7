//! Paste HTTP handlers.

use super::request_base_url;
use crate::{error::HttpError, models::paste::*, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};

/// Create a new paste.
///
/// # Arguments
/// - `state`: Application state.
/// - `headers`: Request headers, used to derive the share URL origin.
/// - `payload`: Paste creation payload.
///
/// # Returns
/// `200 OK` with the new id, share URL, and creation timestamp.
///
/// # Errors
/// Returns an error if validation or persistence fails.
pub async fn create_paste(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreatePasteRequest>, JsonRejection>,
) -> Result<Json<CreatedPaste>, HttpError> {
    let Json(req) = payload?;
    let base_url = request_base_url(&state.config, &headers);
    let created = state.pastes.create_from_request(&req, &base_url).await?;
    Ok(Json(created))
}

/// Create up to ten pastes in one request.
///
/// Invalid entries are skipped without being reported individually.
///
/// # Returns
/// `200 OK` with the pastes that were created.
///
/// # Errors
/// Returns an error if the batch is empty, oversized, has no valid entries,
/// or persistence fails.
pub async fn create_pastes_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateBatchRequest>, JsonRejection>,
) -> Result<Json<CreateBatchResponse>, HttpError> {
    let Json(req) = payload?;
    let candidates = req.candidates()?;
    let base_url = request_base_url(&state.config, &headers);
    let pastes = state.pastes.create_batch(&candidates, &base_url).await?;
    tracing::debug!(
        "batch created {} of {} pastes",
        pastes.len(),
        candidates.len()
    );
    Ok(Json(CreateBatchResponse { pastes }))
}

/// Fetch a paste by id, counting one view.
///
/// # Returns
/// Content plus remaining views and expiry metadata.
///
/// # Errors
/// Returns not found for absent, expired, or view-exhausted pastes.
pub async fn get_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PasteView>, HttpError> {
    let fetched = state.pastes.fetch(&id).await?;
    Ok(Json(fetched.view))
}

/// Replace the content of a live paste.
///
/// # Returns
/// A confirmation message and the stored content.
///
/// # Errors
/// Returns an error for blank content, absent pastes, expired pastes, or
/// persistence failures.
pub async fn update_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePasteRequest>, JsonRejection>,
) -> Result<Json<UpdatePasteResponse>, HttpError> {
    let Json(req) = payload?;
    let content = state
        .pastes
        .update_content(&id, req.content.as_ref())
        .await?;
    Ok(Json(UpdatePasteResponse {
        message: "Paste updated successfully".to_string(),
        content,
    }))
}
