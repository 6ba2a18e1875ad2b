//! Error types for the knowledge index.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// The embedding backend failed or returned something unusable.
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("embedding timed out after {0:?}")]
    Timeout(Duration),

    #[error("embedding has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("knowledge store unavailable: {0}")]
    Unavailable(#[from] r2d2::Error),

    #[error("knowledge database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("knowledge task failed: {0}")]
    Task(String),
}
