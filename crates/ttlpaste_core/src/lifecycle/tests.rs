//! Lifecycle engine tests: creation, view accounting, expiry, and updates.

use super::*;
use crate::clock::ManualClock;
use crate::store::{MemoryStore, StoreError, StoredValue, SwapOutcome, TtlStatus};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const START: i64 = 1_700_000_000_000;
const BASE: &str = "http://paste.test";

struct Harness {
    service: PasteService,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

fn setup() -> Harness {
    let clock = Arc::new(ManualClock::new(START));
    let store = Arc::new(MemoryStore::with_clock(clock.clone()));
    let service = PasteService::with_clock(store.clone(), clock.clone());
    Harness {
        service,
        store,
        clock,
    }
}

fn request(content: Value, ttl_seconds: Option<Value>, max_views: Option<Value>) -> CreatePasteRequest {
    CreatePasteRequest {
        content: Some(content),
        ttl_seconds,
        max_views,
    }
}

async fn create(h: &Harness, content: &str, ttl: Option<u64>, max_views: Option<u64>) -> String {
    let req = request(json!(content), ttl.map(|t| json!(t)), max_views.map(|m| json!(m)));
    h.service
        .create_from_request(&req, BASE)
        .await
        .expect("create")
        .id
}

#[tokio::test]
async fn fetch_after_create_returns_trimmed_content() {
    let h = setup();
    let id = create(&h, "  hello world \n\t", Some(60), Some(5)).await;

    let fetched = h.service.fetch(&id).await.expect("fetch");
    assert_eq!(fetched.view.content, "hello world");
    assert!(!fetched.view.is_expired);
    assert_eq!(fetched.view.remaining_views, Some(4));
    assert_eq!(fetched.record.views, 1);
    assert_eq!(fetched.view.created_at, "2023-11-14T22:13:20.000Z");
    assert_eq!(
        fetched.view.expires_at.as_deref(),
        Some("2023-11-14T22:14:20.000Z")
    );
}

#[tokio::test]
async fn create_returns_share_url_and_iso_timestamp() {
    let h = setup();
    let created = h
        .service
        .create_from_request(&request(json!("x"), None, None), "https://host.example/")
        .await
        .expect("create");
    assert_eq!(created.url, format!("https://host.example/p/{}", created.id));
    assert_eq!(created.created_at, "2023-11-14T22:13:20.000Z");
    assert_eq!(h.store.live_keys().expect("count"), 1);
}

#[tokio::test]
async fn unlimited_paste_reports_null_metadata() {
    let h = setup();
    let id = create(&h, "forever", None, None).await;
    h.clock.advance(365 * 24 * 3_600 * 1_000);
    let view = h.service.fetch(&id).await.expect("fetch").view;
    assert_eq!(view.remaining_views, None);
    assert_eq!(view.expires_at, None);
    assert!(!view.is_expired);
}

#[tokio::test]
async fn exactly_max_views_fetches_succeed() {
    for max_views in [1_u64, 2, 5] {
        let h = setup();
        let id = create(&h, "limited", None, Some(max_views)).await;

        for served in 1..=max_views {
            let view = h.service.fetch(&id).await.expect("fetch within limit").view;
            assert_eq!(view.remaining_views, Some(max_views - served));
            assert_eq!(view.content, "limited");
        }
        let err = h.service.fetch(&id).await.expect_err("limit reached");
        assert!(matches!(err, AppError::NotFound), "max_views {}", max_views);
    }
}

#[tokio::test]
async fn single_view_scenario() {
    let h = setup();
    let id = create(&h, "hello", None, Some(1)).await;

    let view = h.service.fetch(&id).await.expect("first fetch").view;
    assert_eq!(view.content, "hello");
    assert_eq!(view.remaining_views, Some(0));
    assert!(!view.is_expired);

    assert!(matches!(
        h.service.fetch(&id).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn ttl_boundary_matrix() {
    // (offset after creation in ms, served)
    let cases = [(0, true), (999, true), (1_000, true), (1_001, false), (2_000, false)];
    for (offset, served) in cases {
        let h = setup();
        let id = create(&h, "x", Some(1), None).await;
        h.clock.advance(offset);
        let result = h.service.fetch(&id).await;
        assert_eq!(result.is_ok(), served, "offset {}", offset);
        if !served {
            assert!(matches!(result, Err(AppError::NotFound)));
        }
    }
}

#[tokio::test]
async fn application_ttl_check_applies_even_if_store_kept_the_key() {
    let h = setup();
    h.store
        .insert_value(
            "paste:stale1",
            StoredValue::Structured(json!({
                "content": "stale",
                "ttl_seconds": 1,
                "max_views": 0,
                "created_at": START - 5_000,
                "views": 0
            })),
        )
        .expect("seed");

    assert!(matches!(
        h.service.fetch("stale1").await,
        Err(AppError::NotFound)
    ));
    let untouched = h.service.db().get("stale1").await.expect("get").expect("present");
    assert_eq!(untouched.views, 0, "rejected fetch must not count a view");
}

#[tokio::test]
async fn absent_malformed_and_invalid_ids_are_not_found() {
    let h = setup();
    h.store
        .insert_value("paste:broken", StoredValue::Text("<<<".to_string()))
        .expect("seed");

    for id in ["missing", "broken", "", "bad id", "../x"] {
        assert!(
            matches!(h.service.fetch(id).await, Err(AppError::NotFound)),
            "id {:?}",
            id
        );
    }
}

#[tokio::test]
async fn degraded_record_is_still_served() {
    let h = setup();
    h.store
        .insert_value("paste:partial", StoredValue::Structured(json!({ "content": "kept" })))
        .expect("seed");

    let fetched = h.service.fetch("partial").await.expect("fetch");
    assert_eq!(fetched.view.content, "kept");
    assert_eq!(fetched.record.views, 1);
    assert_eq!(fetched.view.remaining_views, None);
}

#[tokio::test]
async fn update_preserves_everything_but_content() {
    let h = setup();
    let id = create(&h, "before", Some(120), Some(10)).await;
    h.service.fetch(&id).await.expect("fetch");
    h.clock.advance(20_000);
    let before = h.service.db().get(&id).await.expect("get").expect("present");

    let content = h
        .service
        .update_content(&id, Some(&json!("  after  ")))
        .await
        .expect("update");
    assert_eq!(content, "after");

    let after = h.service.db().get(&id).await.expect("get").expect("present");
    assert_eq!(
        after,
        PasteRecord {
            content: "after".to_string(),
            ..before
        }
    );
    assert_eq!(
        h.store
            .ttl_remaining(&crate::db::paste_key(&id))
            .await
            .expect("ttl"),
        TtlStatus::Expires(Duration::from_secs(100))
    );

    let view = h.service.fetch(&id).await.expect("fetch after update").view;
    assert_eq!(view.content, "after");
    assert_eq!(view.expires_at.as_deref(), Some("2023-11-14T22:15:20.000Z"));
    assert_eq!(view.remaining_views, Some(8));
}

#[tokio::test]
async fn update_on_view_exhausted_paste_is_conflict_and_leaves_content() {
    let h = setup();
    let id = create(&h, "original", None, Some(1)).await;
    h.service.fetch(&id).await.expect("consume only view");

    let err = h
        .service
        .update_content(&id, Some(&json!("replacement")))
        .await
        .expect_err("expired paste");
    assert!(matches!(err, AppError::Conflict(_)));
    let stored = h.service.db().get(&id).await.expect("get").expect("present");
    assert_eq!(stored.content, "original");
}

#[tokio::test]
async fn update_on_time_expired_paste_is_conflict() {
    let h = setup();
    h.store
        .insert_value(
            "paste:old",
            StoredValue::Structured(json!({
                "content": "old",
                "ttl_seconds": 1,
                "max_views": 0,
                "created_at": START - 1_001,
                "views": 0
            })),
        )
        .expect("seed");

    let err = h
        .service
        .update_content("old", Some(&json!("new")))
        .await
        .expect_err("expired paste");
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Cannot update expired paste"));
}

#[tokio::test]
async fn update_validation_and_absence() {
    let h = setup();
    let id = create(&h, "x", None, None).await;

    for content in [None, Some(json!("   ")), Some(json!(3))] {
        let err = h
            .service
            .update_content(&id, content.as_ref())
            .await
            .expect_err("invalid content");
        assert!(matches!(err, AppError::Validation(_)));
    }
    let err = h
        .service
        .update_content("nope", Some(&json!("y")))
        .await
        .expect_err("absent");
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn create_rejects_invalid_requests() {
    let h = setup();
    let cases = [
        request(json!(""), None, None),
        request(json!("x"), Some(json!(0)), None),
        request(json!("x"), None, Some(json!(-1))),
        request(json!("x"), Some(json!(2.5)), None),
    ];
    for req in cases {
        let err = h
            .service
            .create_from_request(&req, BASE)
            .await
            .expect_err("invalid request");
        assert!(matches!(err, AppError::Validation(_)), "{:?}", req);
    }
    assert_eq!(h.store.live_keys().expect("count"), 0);
}

#[tokio::test]
async fn size_limit_is_configurable() {
    let clock = Arc::new(ManualClock::new(START));
    let store = Arc::new(MemoryStore::with_clock(clock.clone()));
    let service = PasteService::with_clock(store, clock).with_max_paste_size(4);
    assert_eq!(service.max_paste_size(), 4);

    assert!(service
        .create_from_request(&request(json!("four"), None, None), BASE)
        .await
        .is_ok());
    assert!(matches!(
        service
            .create_from_request(&request(json!("fives"), None, None), BASE)
            .await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn batch_skips_invalid_candidates() {
    let h = setup();
    let candidates = vec![
        request(json!("first"), None, None),
        request(json!("   "), None, None),
        request(json!("second"), Some(json!(30)), Some(json!(2))),
    ];
    let created = h
        .service
        .create_batch(&candidates, BASE)
        .await
        .expect("batch");
    assert_eq!(created.len(), 2);

    let first = h.service.fetch(&created[0].id).await.expect("first").view;
    assert_eq!(first.content, "first");
    let second = h.service.fetch(&created[1].id).await.expect("second").view;
    assert_eq!(second.content, "second");
    assert_eq!(second.remaining_views, Some(1));
}

#[tokio::test]
async fn batch_rejects_empty_oversized_and_all_invalid() {
    let h = setup();
    let err = h.service.create_batch(&[], BASE).await.expect_err("empty");
    assert!(matches!(err, AppError::Validation(ref m) if m.contains("non-empty")));

    let oversized: Vec<_> = (0..=MAX_BATCH_SIZE)
        .map(|i| request(json!(format!("paste {}", i)), None, None))
        .collect();
    let err = h
        .service
        .create_batch(&oversized, BASE)
        .await
        .expect_err("oversized");
    assert!(matches!(err, AppError::Validation(ref m) if m.contains("Maximum 10")));
    assert_eq!(h.store.live_keys().expect("count"), 0);

    let invalid = vec![request(json!(""), None, None), request(json!(1), None, None)];
    let err = h
        .service
        .create_batch(&invalid, BASE)
        .await
        .expect_err("all invalid");
    assert!(matches!(err, AppError::Validation(ref m) if m.contains("No valid pastes")));
}

#[tokio::test]
async fn delete_is_idempotent_and_hides_paste() {
    let h = setup();
    let id = create(&h, "x", None, None).await;
    h.service.delete(&id).await.expect("delete");
    h.service.delete(&id).await.expect("delete again");
    assert!(matches!(
        h.service.fetch(&id).await,
        Err(AppError::NotFound)
    ));
}

/// Memory store that yields to the scheduler before every call, so
/// concurrent fetches interleave between their read and their write.
struct InterleavingStore {
    inner: MemoryStore,
}

#[async_trait]
impl KvStore for InterleavingStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.set(key, value).await
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.set_with_expiry(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.get(key).await
    }

    async fn ttl_remaining(&self, key: &str) -> Result<TtlStatus, StoreError> {
        tokio::task::yield_now().await;
        self.inner.ttl_remaining(key).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &StoredValue,
        value: &str,
    ) -> Result<SwapOutcome, StoreError> {
        tokio::task::yield_now().await;
        self.inner.compare_and_swap(key, expected, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        tokio::task::yield_now().await;
        self.inner.delete(key).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

fn interleaving_service() -> PasteService {
    let clock = Arc::new(ManualClock::new(START));
    let store = Arc::new(InterleavingStore {
        inner: MemoryStore::with_clock(clock.clone()),
    });
    PasteService::with_clock(store, clock)
}

#[tokio::test]
async fn every_served_fetch_counts_a_view() {
    let service = interleaving_service();
    let id = service
        .create_from_request(&request(json!("shared"), None, None), BASE)
        .await
        .expect("create")
        .id;

    let (a, b, c) = tokio::join!(service.fetch(&id), service.fetch(&id), service.fetch(&id));
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    for _ in 0..5 {
        service.fetch(&id).await.expect("fetch");
    }

    let stored = service.db().get(&id).await.expect("get").expect("present");
    assert_eq!(stored.views, 8);
}

#[tokio::test]
async fn racing_fetches_never_serve_past_the_view_limit() {
    let service = interleaving_service();
    let id = service
        .create_from_request(&request(json!("once"), None, Some(json!(1))), BASE)
        .await
        .expect("create")
        .id;

    let results = tokio::join!(
        service.fetch(&id),
        service.fetch(&id),
        service.fetch(&id),
        service.fetch(&id)
    );
    let results = [results.0, results.1, results.2, results.3];
    let served = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(served, 1);
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|err| matches!(err, AppError::NotFound)));

    let stored = service.db().get(&id).await.expect("get").expect("present");
    assert_eq!(stored.views, 1);
}

/// Store whose every call fails, standing in for a lost connection.
struct DownStore;

#[async_trait]
impl KvStore for DownStore {
    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn set_with_expiry(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<StoredValue>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn ttl_remaining(&self, _key: &str) -> Result<TtlStatus, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn compare_and_swap(
        &self,
        _key: &str,
        _expected: &StoredValue,
        _value: &str,
    ) -> Result<SwapOutcome, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn store_failures_propagate_as_store_unavailable() {
    let service = PasteService::new(Arc::new(DownStore));
    assert!(!service.store_reachable().await);
    assert!(matches!(
        service.fetch("abc").await,
        Err(AppError::StoreUnavailable(_))
    ));
    assert!(matches!(
        service
            .create_from_request(&request(json!("x"), None, None), BASE)
            .await,
        Err(AppError::StoreUnavailable(_))
    ));
    assert!(matches!(
        service.update_content("abc", Some(&json!("x"))).await,
        Err(AppError::StoreUnavailable(_))
    ));
    assert!(matches!(
        service.delete("abc").await,
        Err(AppError::StoreUnavailable(_))
    ));
}

#[test]
fn paste_url_joins_base_and_id() {
    assert_eq!(paste_url("http://a.b", "xyz"), "http://a.b/p/xyz");
    assert_eq!(paste_url("http://a.b/", "xyz"), "http://a.b/p/xyz");
}
