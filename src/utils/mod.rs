//! Utility functions shared across the application.
//!
//! - [`code_generator`] - Short path generation and short URL formatting

pub mod code_generator;
