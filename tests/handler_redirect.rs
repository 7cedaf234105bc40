mod common;

use anony_url::infrastructure::cache::{CacheResult, CacheService};
use anony_url::infrastructure::persistence::FailPoint;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::future::IntoFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use common::{
    OWNER_A, bearer, create_test_state, create_test_state_with_cache, test_server,
};

/// In-memory cache whose first `set_original` waits until released.
#[derive(Default)]
struct GatedCache {
    entries: Mutex<HashMap<String, String>>,
    armed: AtomicBool,
    writing: Notify,
    release: Notify,
}

impl GatedCache {
    fn armed() -> Arc<Self> {
        let cache = Self::default();
        cache.armed.store(true, Ordering::SeqCst);
        Arc::new(cache)
    }
}

#[async_trait]
impl CacheService for GatedCache {
    async fn get_original(&self, short: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(short).cloned())
    }

    async fn set_original(
        &self,
        short: &str,
        original: &str,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.writing.notify_one();
            self.release.notified().await;
        }
        self.entries
            .lock()
            .unwrap()
            .insert(short.to_string(), original.to_string());
        Ok(())
    }

    async fn invalidate(&self, short: &str) -> CacheResult<()> {
        self.entries.lock().unwrap().remove(short);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

async fn create(server: &axum_test::TestServer, url: &str) -> String {
    let body = server
        .post("/api/links")
        .add_header("Authorization", bearer(OWNER_A))
        .json(&json!({ "url": url }))
        .await
        .json::<Value>();

    body["short"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_redirect_success() {
    let (state, _store) = create_test_state();
    let server = test_server(state);

    let short = create(&server, "https://example.com/target").await;

    let response = server.get(&format!("/{short}")).await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_not_found() {
    let (state, _store) = create_test_state();
    let server = test_server(state);

    let response = server.get("/d8e2a4f6/missing0").await;

    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_redirect_inactive_link_looks_missing() {
    let (state, _store) = create_test_state();
    let server = test_server(state);

    let short = create(&server, "https://example.com/target").await;
    server
        .patch("/api/links/status")
        .add_header("Authorization", bearer(OWNER_A))
        .json(&json!({ "url": "https://example.com/target", "is_active": false }))
        .await
        .assert_status_ok();

    let inactive = server.get(&format!("/{short}")).await;
    let missing = server.get("/d8e2a4f6/missing0").await;

    inactive.assert_status_not_found();
    missing.assert_status_not_found();
    assert_eq!(
        inactive.json::<Value>()["error"]["message"],
        missing.json::<Value>()["error"]["message"]
    );
}

#[tokio::test]
async fn test_redirect_store_failure() {
    let (state, store) = create_test_state();
    let server = test_server(state);

    let short = create(&server, "https://example.com/target").await;
    store.fail_on(FailPoint::FindByShort);

    let response = server.get(&format!("/{short}")).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"]["code"], "store_error");
}

#[tokio::test]
async fn test_deactivation_during_cache_fill_is_not_served_from_cache() {
    let cache = GatedCache::armed();
    let (state, _store) = create_test_state_with_cache(cache.clone());
    let server = test_server(state);

    let short = create(&server, "https://example.com/target").await;
    let path = format!("/{short}");

    let redirect = server.get(&path).into_future();
    let deactivate = async {
        // The redirect has read the active link and is about to cache it.
        cache.writing.notified().await;

        server
            .patch("/api/links/status")
            .add_header("Authorization", bearer(OWNER_A))
            .json(&json!({ "url": "https://example.com/target", "is_active": false }))
            .await
            .assert_status_ok();

        cache.release.notify_one();
    };

    let (in_flight, ()) = tokio::join!(redirect, deactivate);
    in_flight.assert_status_not_found();

    assert!(cache.entries.lock().unwrap().is_empty());
    server.get(&path).await.assert_status_not_found();
}
