//! Server-rendered paste pages behind share links.

use crate::{templates, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};
use ttlpaste_core::models::paste::PasteView;
use ttlpaste_core::sanitize;

fn footer_text(view: &PasteView) -> Option<String> {
    let views = view.remaining_views.map(|left| match left {
        0 => "This was the last view".to_string(),
        1 => "1 view remaining".to_string(),
        n => format!("{} views remaining", n),
    });
    let expiry = view
        .expires_at
        .as_deref()
        .map(|at| format!("Expires at {}", at));

    match (views, expiry) {
        (Some(views), Some(expiry)) => Some(format!("{}. {}", views, expiry)),
        (views, expiry) => views.or(expiry),
    }
}

/// Render a paste as a standalone HTML page, counting one view.
///
/// Content is sanitized to formatting tags only. Absent and expired pastes
/// get a 404 page; store failures get a 500 page without details.
pub async fn view_paste_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Html<String>) {
    match state.pastes.fetch(&id).await {
        Ok(fetched) => {
            let safe = sanitize::render_safe(&fetched.view.content);
            let footer = footer_text(&fetched.view);
            (
                StatusCode::OK,
                Html(templates::paste_page(&safe, footer.as_deref())),
            )
        }
        Err(err) if err.is_not_found() => {
            (StatusCode::NOT_FOUND, Html(templates::not_found_page()))
        }
        Err(err) => {
            tracing::error!("Error rendering paste page for {}: {}", id, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(templates::error_page()),
            )
        }
    }
}
