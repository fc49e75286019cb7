//! Configuration loading from environment variables.

use crate::constants::{DEFAULT_MAX_PASTE_SIZE, DEFAULT_PORT};
use std::env;
use std::fmt;
use thiserror::Error;

/// Which key-value store backs paste persistence.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store; contents vanish on restart.
    Memory,
    /// Upstash Redis over its REST protocol.
    Upstash { url: String, token: String },
}

impl fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::Upstash { url, .. } => f
                .debug_struct("Upstash")
                .field("url", url)
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Upstash { .. } => "upstash",
        }
    }
}

/// Invalid configuration detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown STORE_BACKEND '{0}' (expected 'memory' or 'upstash')")]
    UnknownBackend(String),

    #[error("STORE_BACKEND=upstash requires UPSTASH_REDIS_REST_URL and UPSTASH_REDIS_REST_TOKEN")]
    MissingCredentials,
}

/// Runtime configuration for the paste service.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_paste_size: usize,
    pub allow_public_access: bool,
    /// Origin used for share links; derived per request when unset.
    pub public_base_url: Option<String>,
    pub store: StoreBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_paste_size: DEFAULT_MAX_PASTE_SIZE,
            allow_public_access: false,
            public_base_url: None,
            store: StoreBackend::Memory,
        }
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Pick the store backend from `STORE_BACKEND` and the Upstash credentials.
///
/// Without an explicit choice, Upstash is used when both credentials are set.
fn resolve_store_backend(
    requested: Option<&str>,
    url: Option<String>,
    token: Option<String>,
) -> Result<StoreBackend, ConfigError> {
    let credentials = match (url, token) {
        (Some(url), Some(token)) => Some(StoreBackend::Upstash { url, token }),
        _ => None,
    };

    match requested.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(credentials.unwrap_or(StoreBackend::Memory)),
        Some("memory") => Ok(StoreBackend::Memory),
        Some("upstash") => credentials.ok_or(ConfigError::MissingCredentials),
        Some(other) => Err(ConfigError::UnknownBackend(other.to_string())),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the store backend selection is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let store = resolve_store_backend(
            non_empty_var("STORE_BACKEND").as_deref(),
            non_empty_var("UPSTASH_REDIS_REST_URL"),
            non_empty_var("UPSTASH_REDIS_REST_TOKEN"),
        )?;

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            max_paste_size: env::var("MAX_PASTE_SIZE")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_PASTE_SIZE),
            allow_public_access: env_flag_enabled("ALLOW_PUBLIC_ACCESS"),
            public_base_url: non_empty_var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            store,
        })
    }
}
