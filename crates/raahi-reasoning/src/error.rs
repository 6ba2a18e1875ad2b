//! Error types for the reasoning adapter.

#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("reasoning request failed: {0}")]
    Request(String),

    #[error("reasoning backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("reasoning response contained no content")]
    EmptyResponse,

    /// The model's content was not a usable trip state, including enum
    /// values outside the closed sets.
    #[error("unparseable trip state: {0}")]
    InvalidState(String),
}
