//! Keyed paste persistence on top of the store adapter.
//!
//! Every read-modify-write here is optimistic: read the raw value, apply the
//! change, then compare-and-swap against what was read. A concurrent writer
//! makes the swap fail and the change is re-applied to the fresh value, so
//! no update is lost. The swap keeps the key's remaining store-native expiry;
//! it is never recomputed from `created_at`.

use crate::clock::Clock;
use crate::codec;
use crate::constants::PASTE_KEY_PREFIX;
use crate::error::AppError;
use crate::models::paste::PasteRecord;
use crate::store::{KvStore, SwapOutcome};
use std::sync::Arc;


/// Swap attempts before a contended write gives up.
const MAX_SWAP_ATTEMPTS: usize = 16;

/// Outcome of a guarded read-modify-write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBack {
    /// The change was stored; carries the record as written.
    Written(PasteRecord),
    /// The record was expired at `now`; nothing was written.
    Expired(PasteRecord),
    /// The key was absent or disappeared before the write landed.
    Absent,
}

/// Store key for a paste id.
pub fn paste_key(id: &str) -> String {
    format!("{}{}", PASTE_KEY_PREFIX, id)
}

/// Accessor for paste records in the key-value store.
#[derive(Clone)]
pub struct PasteDb {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl PasteDb {
    /// Bind paste persistence to a store and a clock.
    ///
    /// The clock only supplies the default `created_at` for records that lost
    /// theirs.
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Underlying store handle.
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Whether a key exists for `id`.
    ///
    /// # Errors
    /// Returns [`AppError::StoreUnavailable`] when the store call fails.
    pub async fn exists(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.store.get(&paste_key(id)).await?.is_some())
    }

    /// Persist a new record, attaching store-native expiry when time-limited.
    ///
    /// # Errors
    /// Returns [`AppError::StoreUnavailable`] when the store call fails.
    pub async fn insert(&self, id: &str, record: &PasteRecord) -> Result<(), AppError> {
        let key = paste_key(id);
        let encoded = codec::encode(record)?;
        match record.store_ttl() {
            Some(ttl) => self.store.set_with_expiry(&key, &encoded, ttl).await?,
            None => self.store.set(&key, &encoded).await?,
        }
        Ok(())
    }

    /// Fetch and decode a record.
    ///
    /// # Returns
    /// `Ok(Some(record))` when present, `Ok(None)` when absent or evicted.
    ///
    /// # Errors
    /// Returns [`AppError::MalformedRecord`] for unparsable payloads and
    /// [`AppError::StoreUnavailable`] when the store call fails.
    pub async fn get(&self, id: &str) -> Result<Option<PasteRecord>, AppError> {
        match self.store.get(&paste_key(id)).await? {
            Some(raw) => codec::decode(&raw, self.clock.now_millis()).map(Some),
            None => Ok(None),
        }
    }

    /// Add one view to a live record.
    ///
    /// Expiry is judged at `now_millis` against the freshest read, so a
    /// record exhausted by a concurrent fetch is reported as
    /// [`WriteBack::Expired`] rather than counted past its limit.
    ///
    /// # Errors
    /// Returns [`AppError::MalformedRecord`] or [`AppError::StoreUnavailable`].
    pub async fn increment_views(&self, id: &str, now_millis: i64) -> Result<WriteBack, AppError> {
        self.modify(id, now_millis, |record| {
            record.views = record.views.saturating_add(1)
        })
        .await
    }

    /// Replace content of a live record, leaving counters, timestamps, and
    /// expiry untouched.
    ///
    /// # Errors
    /// Returns [`AppError::MalformedRecord`] or [`AppError::StoreUnavailable`].
    pub async fn update_content(
        &self,
        id: &str,
        content: &str,
        now_millis: i64,
    ) -> Result<WriteBack, AppError> {
        self.modify(id, now_millis, |record| record.content = content.to_string())
            .await
    }

    /// Remove the key for `id`. Idempotent.
    ///
    /// # Returns
    /// Whether a key was removed.
    ///
    /// # Errors
    /// Returns [`AppError::StoreUnavailable`] when the store call fails.
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.store.delete(&paste_key(id)).await?)
    }

    async fn modify<F>(&self, id: &str, now_millis: i64, apply: F) -> Result<WriteBack, AppError>
    where
        F: Fn(&mut PasteRecord),
    {
        let key = paste_key(id);
        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let Some(raw) = self.store.get(&key).await? else {
                return Ok(WriteBack::Absent);
            };
            let mut record = codec::decode(&raw, self.clock.now_millis())?;
            if record.is_expired(now_millis) {
                return Ok(WriteBack::Expired(record));
            }
            apply(&mut record);
            let encoded = codec::encode(&record)?;

            match self.store.compare_and_swap(&key, &raw, &encoded).await? {
                SwapOutcome::Swapped => return Ok(WriteBack::Written(record)),
                // Never recreate an evicted key.
                SwapOutcome::Missing => {
                    tracing::debug!("paste {} vanished during write-back", id);
                    return Ok(WriteBack::Absent);
                }
                SwapOutcome::Changed => {
                    tracing::debug!("paste {} changed under write-back, attempt {}", id, attempt)
                }
            }
        }
        Err(AppError::StoreUnavailable(format!(
            "paste {} still contended after {} attempts",
            id, MAX_SWAP_ATTEMPTS
        )))
    }
}
