//! Voice infrastructure for the Raahi agent.
//!
//! Speech-to-text for the caller's utterance, text-to-speech for the agent's
//! reply, and LiveKit integration for join tokens and per-caller intent
//! signals. Each concern sits behind a small async trait so the turn
//! orchestrator can be driven by stand-ins in tests.

pub mod config;
pub mod error;
pub mod service;
pub mod stt;
pub mod tts;

pub use config::LiveKitConfig;
pub use error::VoiceError;
pub use service::{IntentSignal, Signaler, VoiceService, SIGNAL_TOPIC};
pub use stt::{SttService, Transcriber, MAX_STT_INPUT_BYTES};
pub use tts::{Synthesizer, TtsService};
