//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info, warn};

const KEY_PREFIX: &str = "link:";

/// Redis cache for redirect lookups.
///
/// Shares one multiplexed `ConnectionManager`, which reconnects on its own.
/// Every operation is fail-open.
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: u64,
}

impl RedisCache {
    /// Connects to Redis and checks the connection with a PING.
    ///
    /// `default_ttl_seconds` applies when [`CacheService::set_original`] is
    /// called without a TTL (`CACHE_TTL_SECONDS`).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("invalid Redis URL: {e}")))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        conn.ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("PING failed: {e}")))?;

        info!("Connected to Redis");

        Ok(Self {
            conn,
            default_ttl: default_ttl_seconds,
        })
    }

    fn key(short: &str) -> String {
        format!("{KEY_PREFIX}{short}")
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_original(&self, short: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<String>>(Self::key(short)).await {
            Ok(hit) => {
                debug!(short, hit = hit.is_some(), "Cache lookup");
                Ok(hit)
            }
            Err(e) => {
                warn!(short, error = %e, "Redis GET failed");
                Ok(None)
            }
        }
    }

    async fn set_original(
        &self,
        short: &str,
        original: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::key(short), original, ttl)
            .await
        {
            warn!(short, error = %e, "Redis SET failed");
        }

        Ok(())
    }

    async fn invalidate(&self, short: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();

        match conn.del::<_, i64>(Self::key(short)).await {
            Ok(removed) if removed > 0 => debug!(short, "Cache entry invalidated"),
            Ok(_) => {}
            Err(e) => warn!(short, error = %e, "Redis DEL failed"),
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}
