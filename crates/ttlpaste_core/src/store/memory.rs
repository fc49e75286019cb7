//! In-memory key-value store with lazy expiry.

use super::{KvStore, StoreError, StoredValue, SwapOutcome, TtlStatus};
use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug)]
struct Entry {
    value: StoredValue,
    expires_at: Option<i64>,
}

impl Entry {
    fn is_live(&self, now: i64) -> bool {
        self.expires_at.map_or(true, |at| now <= at)
    }
}

/// Process-local store used for development and tests.
///
/// Entries carry an absolute expiry in epoch milliseconds and are evicted on
/// the first access after `now > expires_at`.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store that reads time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    /// Place an arbitrary value under `key` without expiry.
    ///
    /// Lets callers seed already-structured or corrupt payloads.
    ///
    /// # Errors
    /// Returns an error if the store lock is poisoned.
    pub fn insert_value(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        self.entries()?.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: None,
            },
        );
        Ok(())
    }

    /// Number of keys that are still live.
    ///
    /// # Errors
    /// Returns an error if the store lock is poisoned.
    pub fn live_keys(&self) -> Result<usize, StoreError> {
        let now = self.clock.now_millis();
        Ok(self
            .entries()?
            .values()
            .filter(|entry| entry.is_live(now))
            .count())
    }

    fn write(&self, key: &str, value: &str, expires_at: Option<i64>) -> Result<(), StoreError> {
        self.entries()?.insert(
            key.to_string(),
            Entry {
                value: StoredValue::Text(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    fn live_entry<'a>(
        entries: &'a mut HashMap<String, Entry>,
        key: &str,
        now: i64,
    ) -> Option<&'a Entry> {
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        entries.get(key)
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(key, value, None)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::Backend(
                "invalid expire time in 'set' command".to_string(),
            ));
        }
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = self.clock.now_millis().saturating_add(ttl_ms);
        self.write(key, value, Some(expires_at))
    }

    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let now = self.clock.now_millis();
        let mut entries = self.entries()?;
        Ok(Self::live_entry(&mut entries, key, now).map(|entry| entry.value.clone()))
    }

    async fn ttl_remaining(&self, key: &str) -> Result<TtlStatus, StoreError> {
        let now = self.clock.now_millis();
        let mut entries = self.entries()?;
        Ok(match Self::live_entry(&mut entries, key, now) {
            None => TtlStatus::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => TtlStatus::Persistent,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => TtlStatus::Expires(Duration::from_millis((at - now).unsigned_abs())),
        })
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &StoredValue,
        value: &str,
    ) -> Result<SwapOutcome, StoreError> {
        let now = self.clock.now_millis();
        let mut entries = self.entries()?;
        if Self::live_entry(&mut entries, key, now).is_none() {
            return Ok(SwapOutcome::Missing);
        }
        match entries.get_mut(key) {
            Some(entry) if entry.value == *expected => {
                entry.value = StoredValue::Text(value.to_string());
                Ok(SwapOutcome::Swapped)
            }
            Some(_) => Ok(SwapOutcome::Changed),
            None => Ok(SwapOutcome::Missing),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now_millis();
        let removed = self.entries()?.remove(key);
        Ok(removed.is_some_and(|entry| entry.is_live(now)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.entries().map(|_| ())
    }
}
