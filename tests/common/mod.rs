#![allow(dead_code)]

use anony_url::api::middleware::rate_limit::RateLimit;
use anony_url::application::services::{AuthService, LinkService};
use anony_url::domain::entities::{LinkStatus, NewLink};
use anony_url::infrastructure::cache::{CacheService, NullCache};
use anony_url::infrastructure::persistence::MemoryLinkStore;
use anony_url::routes::build_router;
use anony_url::state::AppState;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "http://s.example.com";

/// Owner ids are UUID-shaped so that bytes `25..33` exist.
pub const OWNER_A: &str = "3f2b8c4e-9a1d-4e7f-b6c5-0d8e2a4f6b1c";
pub const OWNER_B: &str = "7a41c0d2-5e6f-4b3a-8c9d-1e2f3a4b5c6d";

/// Inserts a fixed peer address; the rate limiter keys on it.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

pub fn create_test_state() -> (AppState<MemoryLinkStore>, MemoryLinkStore) {
    create_test_state_with_cache(Arc::new(NullCache::new()))
}

pub fn create_test_state_with_cache(
    cache: Arc<dyn CacheService>,
) -> (AppState<MemoryLinkStore>, MemoryLinkStore) {
    let store = MemoryLinkStore::new();
    let link_service = LinkService::new(Arc::new(store.clone()));
    let auth_service = AuthService::new(SIGNING_SECRET.to_string());

    let state = AppState::new(link_service, auth_service, cache, BASE_URL);
    (state, store)
}

/// Full router over the memory store with a limit generous enough that
/// tests never see 429.
pub fn test_server(state: AppState<MemoryLinkStore>) -> TestServer {
    let app = build_router(
        state,
        RateLimit {
            per_second: 1,
            burst_size: 1000,
        },
    )
    .unwrap()
    .layer(MockConnectInfoLayer);

    TestServer::new(app).unwrap()
}

pub fn owner_token(owner_id: &str) -> String {
    AuthService::new(SIGNING_SECRET.to_string())
        .issue_token(owner_id)
        .unwrap()
}

pub fn bearer(owner_id: &str) -> String {
    format!("Bearer {}", owner_token(owner_id))
}

/// Bearer header with a valid signature for any owner id, including ids
/// `AuthService::issue_token` refuses.
pub fn signed_bearer(owner_id: &str) -> String {
    use hmac::{Hmac, Mac};

    let mut mac = Hmac::<sha2::Sha256>::new_from_slice(SIGNING_SECRET.as_bytes()).unwrap();
    mac.update(owner_id.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("Bearer {owner_id}.{signature}")
}

pub fn new_link(
    id: &str,
    original: &str,
    short: impl Into<String>,
    status: LinkStatus,
) -> NewLink {
    NewLink::new(id, original, short, status)
}
