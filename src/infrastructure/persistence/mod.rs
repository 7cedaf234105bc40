//! Link store implementations.
//!
//! # Stores
//!
//! - [`PgLinkStore`] - PostgreSQL via SQLx; [`PgLinkRepository`] runs the queries
//!   on a pooled connection or an open transaction
//! - [`MemoryLinkStore`] - In-process store with snapshot transactions and
//!   fail-point injection

pub mod memory_link_store;
pub mod pg_link_store;

pub use memory_link_store::{FailPoint, MemoryLinkStore};
pub use pg_link_store::{PgLinkRepository, PgLinkStore};
