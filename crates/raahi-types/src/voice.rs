//! Voice profile definitions.
//!
//! A `VoiceProfile` maps a locale to the piper model used to speak it. The
//! synthesizer picks a profile from the language hint of each reply.

use serde::{Deserialize, Serialize};

/// Locale hint used for English replies.
pub const LOCALE_EN_US: &str = "en-US";
/// Locale hint used for replies containing Devanagari.
pub const LOCALE_HI_IN: &str = "hi-IN";

/// Picks the synthesis locale for a reply.
pub fn locale_for_text(text: &str) -> &'static str {
    if crate::contains_devanagari(text) {
        LOCALE_HI_IN
    } else {
        LOCALE_EN_US
    }
}

/// A voice profile configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// BCP 47 locale this voice speaks (e.g. `hi-IN`).
    pub locale: String,
    /// Path to the model file (relative to the voices directory or absolute).
    pub model_path: String,
    /// Path to the model configuration file (if applicable).
    #[serde(default)]
    pub config_path: Option<String>,
    /// Speech speed multiplier (1.0 is normal).
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Speaker ID within a multi-speaker model (0-indexed).
    #[serde(default)]
    pub speaker_id: Option<u32>,
}

fn default_speed() -> f32 {
    1.0
}

impl VoiceProfile {
    pub fn new(locale: impl Into<String>, model_path: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            model_path: model_path.into(),
            config_path: None,
            speed: default_speed(),
            speaker_id: None,
        }
    }

    /// The bundled defaults: an English and a Hindi piper voice.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(LOCALE_EN_US, "en_US-lessac-medium.onnx"),
            Self::new(LOCALE_HI_IN, "hi_IN-pratham-medium.onnx"),
        ]
    }
}
