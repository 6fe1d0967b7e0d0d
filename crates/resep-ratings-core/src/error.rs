//! Error types for rating operations

use thiserror::Error;

/// Main error type for all rating operations
#[derive(Error, Debug, Clone)]
pub enum RatingError {
    /// Score outside the accepted [1, 5] range
    #[error("score must be between 1 and 5, got {score}")]
    InvalidScore { score: i64 },

    /// A required identifier was empty
    #[error("missing {0}")]
    MissingIdentifier(&'static str),

    /// Store unavailable or a write was rejected
    #[error("storage error: {0}")]
    Storage(String),

    /// A persisted document could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The remote rating service reported a failure
    #[error("remote service error: {0}")]
    Remote(String),
}

/// Result type alias for rating operations
pub type Result<T> = std::result::Result<T, RatingError>;
