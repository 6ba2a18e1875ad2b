//! Error types for the session store.

/// Errors that can occur while reading or writing sessions.
///
/// Every variant is fatal for a conversation turn: a turn cannot proceed
/// without knowing the caller's current state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store unavailable: {0}")]
    Unavailable(#[from] r2d2::Error),

    #[error("session database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored state could not be encoded or decoded.
    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session task failed: {0}")]
    Task(String),
}
