//! Infrastructure layer for external integrations.
//!
//! Implements the storage contracts defined by the domain layer and provides
//! the redirect cache.
//!
//! - [`cache`] - Redirect cache (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL and in-memory link stores

pub mod cache;
pub mod persistence;
