//! Domain layer for the review loop
//!
//! This module contains the review data model, domain errors, and the port
//! traits that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{EvaluatorError, ReviewError, ReviewResult};
