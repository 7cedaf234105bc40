//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`Link`] - A persisted short link
//! - [`NewLink`] - Caller-supplied link handed to the save operation
//! - [`LinkStatus`] - Closed active/inactive visibility state
//! - [`ListFilter`] - Status selector for listing
//! - [`LinkCounts`] - Per-owner counters

pub mod link;

pub use link::{Link, LinkCounts, LinkStatus, ListFilter, NewLink};
