//! Health probe.

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Body of `GET /api/healthz`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub message: String,
}

/// Report store connectivity.
///
/// Always answers 200; the `store` field says whether a ping succeeded.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend = state.config.store.name();
    let response = if state.pastes.store_reachable().await {
        HealthResponse {
            status: "ok",
            store: "connected",
            message: format!("{} store connection successful", backend),
        }
    } else {
        HealthResponse {
            status: "ok",
            store: "disconnected",
            message: format!(
                "{} store connection failed. Verify UPSTASH_REDIS_REST_URL and UPSTASH_REDIS_REST_TOKEN.",
                backend
            ),
        }
    };
    Json(response)
}
