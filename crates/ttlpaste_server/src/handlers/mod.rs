//! HTTP request handlers.

/// Store connectivity probe.
pub mod health;
/// Server-rendered share pages.
pub mod page;
/// Paste JSON endpoints.
pub mod paste;

use axum::http::{header, HeaderMap};
use ttlpaste_core::Config;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Origin used to build share links for this request.
///
/// `PUBLIC_BASE_URL` wins. Otherwise the `Host` header is combined with the
/// scheme from `X-Forwarded-Proto` (first entry), defaulting to `http`.
pub(crate) fn request_base_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(base) = config.public_base_url.as_deref() {
        return base.trim_end_matches('/').to_string();
    }

    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| matches!(*value, "http" | "https"))
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("localhost:{}", config.port));

    format!("{}://{}", scheme, host)
}
