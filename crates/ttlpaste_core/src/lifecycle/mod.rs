//! Paste lifecycle engine.
//!
//! A paste is `Absent`, `Active`, or `Expired`. Two independent mechanisms
//! expire it: store-native key expiry for `ttl_seconds`, and the view counter
//! compared against `max_views` here. Expired and absent pastes are reported
//! identically as [`AppError::NotFound`].
//!
//! Fetches are not serialized per id. Each view is counted with a
//! compare-and-swap in [`PasteDb`], so racing fetches retry instead of
//! overwriting each other: every served fetch is counted, and at most
//! `max_views` fetches are served.

use crate::clock::{Clock, SystemClock};
use crate::constants::{DEFAULT_MAX_PASTE_SIZE, MAX_BATCH_SIZE, PASTE_PAGE_PREFIX};
use crate::db::{PasteDb, WriteBack};
use crate::error::AppError;
use crate::models::paste::{
    iso_millis, validate_content, CreatePasteRequest, CreatedPaste, PasteDraft, PasteRecord,
    PasteView,
};
use crate::naming;
use crate::store::KvStore;
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// A successful fetch: the record after its view was counted, plus the
/// response metadata derived from it.
#[derive(Debug, Clone)]
pub struct FetchedPaste {
    pub record: PasteRecord,
    pub view: PasteView,
}

/// Entry point for every paste operation.
#[derive(Clone)]
pub struct PasteService {
    db: PasteDb,
    clock: Arc<dyn Clock>,
    max_paste_size: usize,
}

/// Build the public share link for a paste.
pub fn paste_url(base_url: &str, id: &str) -> String {
    format!(
        "{}{}/{}",
        base_url.trim_end_matches('/'),
        PASTE_PAGE_PREFIX,
        id
    )
}

impl PasteService {
    /// Create a service over `store` using the system clock and default limits.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a service whose expiry decisions read time from `clock`.
    pub fn with_clock(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db: PasteDb::new(store, clock.clone()),
            clock,
            max_paste_size: DEFAULT_MAX_PASTE_SIZE,
        }
    }

    /// Override the maximum accepted content size in bytes.
    pub fn with_max_paste_size(mut self, max_paste_size: usize) -> Self {
        self.max_paste_size = max_paste_size;
        self
    }

    pub fn max_paste_size(&self) -> usize {
        self.max_paste_size
    }

    /// Persistence handle, exposed for maintenance and tests.
    pub fn db(&self) -> &PasteDb {
        &self.db
    }

    /// Create a paste from a validated draft.
    ///
    /// # Arguments
    /// - `draft`: Validated content and limits.
    /// - `base_url`: Origin used to build the share link.
    ///
    /// # Returns
    /// The new id, its share URL, and the creation timestamp.
    ///
    /// # Errors
    /// Returns [`AppError::StoreUnavailable`] when the store fails.
    pub async fn create(&self, draft: PasteDraft, base_url: &str) -> Result<CreatedPaste, AppError> {
        let db = &self.db;
        let id = naming::generate_unique_id(|candidate| async move { db.exists(&candidate).await })
            .await?;
        let record = draft.into_record(self.clock.now_millis());
        db.insert(&id, &record).await?;
        tracing::debug!(
            "created paste {} (ttl_seconds={}, max_views={})",
            id,
            record.ttl_seconds,
            record.max_views
        );

        Ok(CreatedPaste {
            url: paste_url(base_url, &id),
            created_at: iso_millis(record.created_at),
            id,
        })
    }

    /// Validate a raw create request and create the paste.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for bad input and
    /// [`AppError::StoreUnavailable`] when the store fails.
    pub async fn create_from_request(
        &self,
        req: &CreatePasteRequest,
        base_url: &str,
    ) -> Result<CreatedPaste, AppError> {
        let draft = PasteDraft::from_request(req, self.max_paste_size)?;
        self.create(draft, base_url).await
    }

    /// Create up to [`MAX_BATCH_SIZE`] pastes, skipping invalid candidates.
    ///
    /// Candidates are processed one by one; there is no batch atomicity.
    ///
    /// # Returns
    /// The pastes that were created, in input order.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when the batch is empty, oversized, or
    /// no candidate survives validation, and [`AppError::StoreUnavailable`]
    /// when a store write fails.
    pub async fn create_batch(
        &self,
        candidates: &[CreatePasteRequest],
        base_url: &str,
    ) -> Result<Vec<CreatedPaste>, AppError> {
        if candidates.is_empty() {
            return Err(AppError::Validation(
                "pastes must be a non-empty array".to_string(),
            ));
        }
        if candidates.len() > MAX_BATCH_SIZE {
            return Err(AppError::Validation(format!(
                "Maximum {} pastes can be created at once",
                MAX_BATCH_SIZE
            )));
        }

        let mut created = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            match PasteDraft::from_request(candidate, self.max_paste_size) {
                Ok(draft) => created.push(self.create(draft, base_url).await?),
                Err(err) => tracing::debug!("skipping batch candidate {}: {}", index, err),
            }
        }

        if created.is_empty() {
            return Err(AppError::Validation(
                "No valid pastes were created. Please check your input.".to_string(),
            ));
        }
        Ok(created)
    }

    /// Fetch a paste and count the view.
    ///
    /// A fetch that uses up the last allowed view still returns the content;
    /// the paste is reported as not found from the next fetch on.
    ///
    /// # Returns
    /// The post-increment record and response metadata.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for absent, time-expired, or
    /// view-exhausted pastes, and [`AppError::StoreUnavailable`] when the
    /// store fails.
    pub async fn fetch(&self, id: &str) -> Result<FetchedPaste, AppError> {
        if !naming::is_valid_paste_id(id) {
            return Err(AppError::NotFound);
        }
        let record = match self.db.increment_views(id, self.clock.now_millis()).await {
            Ok(WriteBack::Written(record)) => record,
            Ok(WriteBack::Expired(_)) => {
                tracing::debug!("paste {} is expired", id);
                return Err(AppError::NotFound);
            }
            Ok(WriteBack::Absent) => return Err(AppError::NotFound),
            Err(AppError::MalformedRecord(reason)) => {
                tracing::warn!("treating malformed paste {} as absent: {}", id, reason);
                return Err(AppError::NotFound);
            }
            Err(err) => return Err(err),
        };

        // The store may have evicted the key right after the increment.
        if !self.db.exists(id).await? {
            return Err(AppError::NotFound);
        }

        let view = PasteView::from_record(&record, self.clock.now_millis());
        Ok(FetchedPaste { record, view })
    }

    /// Replace the content of a live paste.
    ///
    /// Never changes `views`, `created_at`, `ttl_seconds`, `max_views`, or the
    /// remaining store-native expiry.
    ///
    /// # Returns
    /// The trimmed content that was stored.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for blank content, [`AppError::NotFound`]
    /// for absent pastes, [`AppError::Conflict`] for expired pastes, and
    /// [`AppError::StoreUnavailable`] when the store fails.
    pub async fn update_content(
        &self,
        id: &str,
        content: Option<&serde_json::Value>,
    ) -> Result<String, AppError> {
        let content = validate_content(content, self.max_paste_size)?;
        if !naming::is_valid_paste_id(id) {
            return Err(AppError::NotFound);
        }

        match self
            .db
            .update_content(id, &content, self.clock.now_millis())
            .await
        {
            Ok(WriteBack::Written(_)) => Ok(content),
            Ok(WriteBack::Expired(_)) => {
                Err(AppError::Conflict("Cannot update expired paste".to_string()))
            }
            Ok(WriteBack::Absent) | Err(AppError::MalformedRecord(_)) => Err(AppError::NotFound),
            Err(err) => Err(err),
        }
    }

    /// Remove a paste unconditionally. Idempotent.
    ///
    /// # Errors
    /// Returns [`AppError::StoreUnavailable`] when the store fails.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.db.delete(id).await? {
            tracing::debug!("deleted paste {}", id);
        }
        Ok(())
    }

    /// Probe store connectivity.
    ///
    /// # Returns
    /// `true` when the store answered a ping.
    pub async fn store_reachable(&self) -> bool {
        match self.db.store().ping().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("store ping failed: {}", err);
                false
            }
        }
    }
}
