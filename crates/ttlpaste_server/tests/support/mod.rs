//! Shared integration-test server bootstrap helpers.

use async_trait::async_trait;
use axum_test::TestServer;
use std::sync::Arc;
use std::time::Duration;
use ttlpaste_core::store::{StoreError, StoredValue, SwapOutcome, TtlStatus};
use ttlpaste_core::{KvStore, ManualClock, MemoryStore, PasteService};
use ttlpaste_server::{create_app, AppState, Config};

pub(crate) const START_MILLIS: i64 = 1_700_000_000_000;
pub(crate) const BASE_URL: &str = "https://paste.test";

pub(crate) struct TestEnv {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

pub(crate) fn test_config() -> Config {
    Config {
        port: 0,
        max_paste_size: 1_000,
        public_base_url: Some(BASE_URL.to_string()),
        ..Config::default()
    }
}

pub(crate) fn server_for(config: Config, store: Arc<dyn KvStore>, clock: Arc<ManualClock>) -> TestServer {
    let pastes = PasteService::with_clock(store, clock).with_max_paste_size(config.max_paste_size);
    let state = AppState::with_service(config, pastes);
    TestServer::new(create_app(state)).expect("server")
}

pub(crate) fn setup_with_config(config: Config) -> TestEnv {
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let store = Arc::new(MemoryStore::with_clock(clock.clone()));
    let server = server_for(config, store.clone(), clock.clone());
    TestEnv {
        server,
        store,
        clock,
    }
}

pub(crate) fn setup_test_server() -> TestEnv {
    setup_with_config(test_config())
}

/// Store that refuses every call.
pub(crate) struct UnreachableStore;

fn refused() -> StoreError {
    StoreError::Backend("connection refused by 10.1.2.3".to_string())
}

#[async_trait]
impl KvStore for UnreachableStore {
    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(refused())
    }

    async fn set_with_expiry(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        Err(refused())
    }

    async fn get(&self, _key: &str) -> Result<Option<StoredValue>, StoreError> {
        Err(refused())
    }

    async fn ttl_remaining(&self, _key: &str) -> Result<TtlStatus, StoreError> {
        Err(refused())
    }

    async fn compare_and_swap(
        &self,
        _key: &str,
        _expected: &StoredValue,
        _value: &str,
    ) -> Result<SwapOutcome, StoreError> {
        Err(refused())
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Err(refused())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(refused())
    }
}

pub(crate) fn unreachable_server() -> TestServer {
    server_for(
        test_config(),
        Arc::new(UnreachableStore),
        Arc::new(ManualClock::new(START_MILLIS)),
    )
}
