//! Key-value store adapter.
//!
//! The store offers single-command atomicity only: every call is one network
//! round trip (or one lock acquisition for [`MemoryStore`]), with no
//! multi-key transactions and no retries. Read-modify-write on one key goes
//! through [`KvStore::compare_and_swap`].

/// Process-local backend with millisecond expiry.
pub mod memory;
/// Redis over the Upstash REST protocol.
pub mod upstash;

pub use memory::MemoryStore;
pub use upstash::UpstashStore;

use crate::config::StoreBackend;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failures raised by store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store replied with error: {0}")]
    Backend(String),

    #[error("unexpected store reply: {0}")]
    UnexpectedReply(String),
}

/// A value as returned by the store.
///
/// Some backends hand back the raw string that was written, others decode it
/// into structured JSON first. Callers must accept both.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Text(String),
    Structured(serde_json::Value),
}

impl From<serde_json::Value> for StoredValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Self::Text(text),
            other => Self::Structured(other),
        }
    }
}

/// Remaining store-native expiry of a key.
///
/// Mirrors the Redis `-2` (absent) / `-1` (no expiry) / positive convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStatus {
    Missing,
    Persistent,
    Expires(Duration),
}

impl TtlStatus {
    /// Interpret a millisecond TTL reply (`PTTL` semantics).
    pub fn from_millis_reply(reply: i64) -> Self {
        match reply {
            -1 => Self::Persistent,
            r if r < 0 => Self::Missing,
            r => Self::Expires(Duration::from_millis(r.unsigned_abs())),
        }
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The value matched and was replaced.
    Swapped,
    /// Another writer got there first; nothing was written.
    Changed,
    /// The key is gone; nothing was written.
    Missing,
}

/// Primitive operations the paste engine needs from a key-value store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Write `value` with no expiry, clearing any previous expiry.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write `value` and let the store evict it after `ttl`.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration)
        -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    async fn ttl_remaining(&self, key: &str) -> Result<TtlStatus, StoreError>;

    /// Replace the value of `key` with `value` only while it still holds
    /// `expected`, keeping whatever expiry the key has left.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &StoredValue,
        value: &str,
    ) -> Result<SwapOutcome, StoreError>;

    /// Remove `key`. Returns whether a key was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Round-trip connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Construct the store selected by configuration.
///
/// # Errors
/// Returns an error when the Upstash HTTP client cannot be built.
pub fn open(backend: &StoreBackend) -> Result<Arc<dyn KvStore>, StoreError> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Upstash { url, token } => Ok(Arc::new(UpstashStore::new(url, token)?)),
    }
}
