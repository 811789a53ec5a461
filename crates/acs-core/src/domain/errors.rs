//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mostly validation failures when constructing identifiers or parsing
//! stored enum values.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Identifier was empty, blank or otherwise malformed
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A stored or supplied enum value was not recognised
    #[error("Unknown {kind} value: {value}")]
    UnknownVariant {
        /// Which enum was being parsed
        kind: &'static str,
        /// The offending value
        value: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
