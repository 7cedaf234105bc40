//! Repository trait definitions for the domain layer.
//!
//! These traits abstract link storage following the Repository pattern and are
//! implemented in the infrastructure layer.
//!
//! # Architecture
//!
//! - [`LinkRepository`] - Queries and writes on one connection or transaction
//! - [`LinkTransaction`] - A repository that can be committed or rolled back
//! - [`LinkStore`] - Hands out transactions and plain connections
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock repositories are auto-generated via `mockall` for testing
//!
//! # Testing
//!
//! See `tests/repository_link.rs` for the PostgreSQL implementation.

pub mod link_repository;

pub use link_repository::{LinkRepository, LinkStore, LinkTransaction};

#[cfg(test)]
pub use link_repository::MockLinkRepository;
