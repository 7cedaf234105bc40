//! Cache service trait and error types.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache of `short path -> original URL` for active links.
///
/// Implementations are fail-open: backend errors are logged and reported as
/// a miss (or silently dropped for writes) so redirects fall back to the store.
///
/// Only active links may be cached. Any status change must
/// [`invalidate`](CacheService::invalidate) the link's short path.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Looks up the original URL for a short path.
    ///
    /// Returns `Ok(None)` on a miss or a backend error.
    async fn get_original(&self, short: &str) -> CacheResult<Option<String>>;

    /// Caches `original` under `short`, with the implementation's default TTL
    /// when `ttl_seconds` is `None`.
    async fn set_original(
        &self,
        short: &str,
        original: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Drops the cached entry for `short`.
    async fn invalidate(&self, short: &str) -> CacheResult<()>;

    /// Reports whether the backend answers; used by the health endpoint.
    async fn health_check(&self) -> bool;
}
