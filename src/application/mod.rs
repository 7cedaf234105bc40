//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules inside transactions. Services consume the
//! store traits and provide a clean API for HTTP handlers.
//!
//! - [`services::link_service::LinkService`] - Link lifecycle engine
//! - [`services::auth_service::AuthService`] - Owner token issue and verification
//! - [`unit_of_work::UnitOfWork`] - Transaction scope for engine writes

pub mod services;
pub mod unit_of_work;
