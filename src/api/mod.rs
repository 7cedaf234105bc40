//! REST API layer for HTTP request/response handling.
//!
//! Translates HTTP requests into engine operations and formats responses.
//!
//! - [`dto`] - Request/response types
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Authentication, rate limiting and tracing
//! - [`routes`] - Authenticated route configuration

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
