//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AuthService, LinkService};
use crate::domain::repositories::LinkStore;
use crate::infrastructure::cache::CacheService;

pub struct AppState<S: LinkStore> {
    pub link_service: Arc<LinkService<S>>,
    pub auth_service: Arc<AuthService>,
    pub cache: Arc<dyn CacheService>,
    /// Public origin prepended to short paths in responses.
    pub base_url: Arc<str>,
}

impl<S: LinkStore> AppState<S> {
    pub fn new(
        link_service: LinkService<S>,
        auth_service: AuthService,
        cache: Arc<dyn CacheService>,
        base_url: &str,
    ) -> Self {
        Self {
            link_service: Arc::new(link_service),
            auth_service: Arc::new(auth_service),
            cache,
            base_url: Arc::from(base_url),
        }
    }
}

impl<S: LinkStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            link_service: Arc::clone(&self.link_service),
            auth_service: Arc::clone(&self.auth_service),
            cache: Arc::clone(&self.cache),
            base_url: Arc::clone(&self.base_url),
        }
    }
}
