//! Error types for the Ghost platformer.

use thiserror::Error;

/// Top-level error type for Ghost operations.
#[derive(Debug, Error)]
pub enum GhostError {
    /// Level file errors
    #[error("Level error: {0}")]
    Level(#[from] LevelError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Level description errors.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level file could not be parsed
    #[error("Failed to parse level: {0}")]
    Parse(String),

    /// The level parsed but describes something unusable
    #[error("Invalid level: {0}")]
    Invalid(String),
}

/// Result type alias for Ghost operations.
pub type GhostResult<T> = Result<T, GhostError>;
