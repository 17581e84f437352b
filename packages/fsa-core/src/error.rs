//! Error types for fsa-core
//!
//! Provides unified error handling across the crate.
//!
//! Only the persistence entry points can fail; in-memory operations use
//! sentinel values (`NO`, `NOT_FOUND`) instead of errors.

use thiserror::Error;

/// Main error type for automaton operations
#[derive(Debug, Error)]
pub enum AutomatonError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or truncated persisted image
    #[error("corrupted automaton image: {0}")]
    Corrupted(String),
}

impl AutomatonError {
    /// Create a corruption error
    pub fn corrupted(msg: impl Into<String>) -> Self {
        AutomatonError::Corrupted(msg.into())
    }
}

/// Result type alias for automaton operations
pub type Result<T> = std::result::Result<T, AutomatonError>;
