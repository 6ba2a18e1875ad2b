//! Errors that end a turn without persisting anything.

use std::time::Duration;

use raahi_reasoning::ReasoningError;
use raahi_session::SessionError;
use raahi_voice::VoiceError;

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("invalid turn request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("transcription failed: {0}")]
    Transcription(#[from] VoiceError),

    #[error("transcription was empty")]
    EmptyTranscript,

    #[error(transparent)]
    Reasoning(#[from] ReasoningError),

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    #[error("turn task failed: {0}")]
    Task(String),
}
