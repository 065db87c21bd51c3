//! Error types for relationship graph operations.
//!
//! Every rejection the engine produces is one of these variants, carrying a
//! human-readable message that the request layer passes through verbatim.

use thiserror::Error;

/// Error type for graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Malformed, missing or self-referential identifiers, or a wrong
    /// number of arguments.
    #[error("{0}")]
    InvalidInput(String),

    /// An existing relationship forbids the requested transition.
    #[error("{0}")]
    Conflict(String),

    /// The query ran fine but found nothing.
    #[error("{0}")]
    Empty(String),

    /// Database error from `SQLite`.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage operation failed for a reason other than the driver.
    #[error("storage error: {0}")]
    Storage(String),
}

impl GraphError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// True when the persistence layer could not complete a read or write.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Storage(_))
    }

    /// True for a legitimately empty answer rather than a failure.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::Empty(_))
    }
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
