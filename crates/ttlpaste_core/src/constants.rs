//! Shared constants used across ttlpaste crates.

/// Default API port for ttlpaste.
pub const DEFAULT_PORT: u16 = 3000;

/// Default maximum paste size accepted by the API layer.
pub const DEFAULT_MAX_PASTE_SIZE: usize = 10 * 1024 * 1024;

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://localhost:3000";

/// Store key prefix for paste records.
pub const PASTE_KEY_PREFIX: &str = "paste:";

/// Length of generated paste identifiers.
pub const PASTE_ID_LENGTH: usize = 10;

/// Upper bound on accepted path identifiers.
pub const MAX_PASTE_ID_LENGTH: usize = 64;

/// Largest accepted `ttl_seconds` (100 years), keeping expiry instants
/// representable both as Redis `PX` values and as calendar timestamps.
pub const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 3_600;

/// Maximum number of candidates accepted by one batch create.
pub const MAX_BATCH_SIZE: usize = 10;

/// Public path segment that serves rendered pastes (`/p/<id>`).
pub const PASTE_PAGE_PREFIX: &str = "/p";
