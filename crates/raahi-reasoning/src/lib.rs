//! Trip-state reasoning for the Raahi agent.
//!
//! A [`Reasoner`] takes the caller's transcript, the current [`TripState`]
//! and retrieved knowledge, and returns the full candidate next state. The
//! HTTP implementation talks to any OpenAI-compatible chat completion
//! endpoint and coerces the JSON it returns at this boundary, so loosely
//! typed model output never reaches the state machine.
//!
//! [`TripState`]: raahi_types::TripState

mod client;
pub mod error;
mod parse;
pub mod prompt;

pub use client::{HttpReasoner, Reasoner};
pub use error::ReasoningError;
pub use parse::parse_candidate;
