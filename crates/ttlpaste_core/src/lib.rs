//! Core domain library for ttlpaste (config, store adapter, paste lifecycle).

/// Time source shared by the lifecycle engine and the in-memory store.
pub mod clock;
/// Paste record encoding to and from the store's string representation.
pub mod codec;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across ttlpaste crates.
pub mod constants;
/// Keyed paste persistence on top of the store adapter.
pub mod db;
/// Process-global environment mutation helpers.
pub mod env;
/// Application error types (validation/store/domain).
pub mod error;
/// Paste lifecycle engine: create, fetch, update, delete.
pub mod lifecycle;
/// Data models for API requests and persistence.
pub mod models;
/// Paste identifier generation.
pub mod naming;
/// HTML sanitizing for server-rendered pages.
pub mod sanitize;
/// Key-value store adapter and backends.
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError, StoreBackend};
pub use constants::{DEFAULT_CLI_SERVER_URL, DEFAULT_MAX_PASTE_SIZE, DEFAULT_PORT};
pub use db::{PasteDb, WriteBack};
pub use error::AppError;
pub use lifecycle::PasteService;
pub use store::{
    KvStore, MemoryStore, StoreError, StoredValue, SwapOutcome, TtlStatus, UpstashStore,
};
