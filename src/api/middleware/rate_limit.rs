//! Per-client rate limiting using the token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

/// Rate limiter keyed by the peer IP address.
pub type RateLimitLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Token bucket settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Seconds between replenishing one token, as in
    /// `GovernorConfigBuilder::per_second`.
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimit {
    /// Limits for the public redirect and health endpoints.
    pub const PUBLIC: Self = Self {
        per_second: 2,
        burst_size: 100,
    };

    /// Default limits for the authenticated `/api` endpoints.
    pub const API: Self = Self {
        per_second: 1,
        burst_size: 10,
    };
}

/// Builds a rate limiter from `limit`.
///
/// Requests over the limit get `429 Too Many Requests`. The peer address
/// comes from `ConnectInfo`, so the service must be served with
/// `into_make_service_with_connect_info`.
///
/// # Errors
///
/// Returns an error if the rate or the burst size is zero.
pub fn layer(limit: RateLimit) -> anyhow::Result<RateLimitLayer> {
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(limit.per_second)
        .burst_size(limit.burst_size)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limit settings: {limit:?}"))?;

    Ok(GovernorLayer::new(Arc::new(governor_conf)))
}
