//! Structured error types for the karyon workspace.

use thiserror::Error;

/// Unified error type for all karyon operations.
#[derive(Debug, Error)]
pub enum KaryonError {
    /// Invalid input (malformed matrix, out-of-range values, bad arguments)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A chromosome x condition unit could not be clustered
    #[error("clustering failed for chromosome {chromosome}, condition {condition}: {reason}")]
    Clustering {
        chromosome: String,
        condition: String,
        reason: String,
    },

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the karyon workspace.
pub type Result<T> = std::result::Result<T, KaryonError>;
