//! The conversation-turn pipeline for the Raahi agent.
//!
//! A turn loads the caller's [`TripState`], transcribes the utterance,
//! retrieves knowledge, asks the reasoner for the next state, enforces the
//! booking gate, persists, synthesizes the reply and signals the caller's
//! room. Only session, transcription and reasoning failures abort a turn;
//! everything after persistence degrades instead.
//!
//! [`TripState`]: raahi_types::TripState

mod booking;
mod error;
mod lock;
mod orchestrator;

pub use booking::{BookingError, HttpBooker, TripBooker, DEFAULT_BOOKING_URL};
pub use error::TurnError;
pub use lock::TurnLocks;
pub use orchestrator::{
    normalize_candidate, BookingOutcome, Orchestrator, PipelineSettings, TurnOutcome,
    TurnRequest, DEFAULT_AUDIO_FILE, FALLBACK_REPLY,
};
