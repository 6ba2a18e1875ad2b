use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::{RoomClient, SendDataOptions};
use raahi_types::{Intent, TripState};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Data-message topic clients subscribe to for turn outcomes.
pub const SIGNAL_TOPIC: &str = "intent";

/// Turn outcome pushed to the caller's room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentSignal {
    #[serde(rename = "type")]
    pub kind: String,
    pub intent: Intent,
    pub audio_file: String,
    /// Path under which the server serves `audio_file`.
    pub audio_url: String,
    pub text: String,
    pub trip_state: TripState,
}

impl IntentSignal {
    pub fn new(audio_file: impl Into<String>, text: impl Into<String>, state: &TripState) -> Self {
        let audio_file = audio_file.into();
        Self {
            kind: SIGNAL_TOPIC.to_string(),
            intent: state.intent,
            audio_url: format!("/audio/{}", audio_file),
            audio_file,
            text: text.into(),
            trip_state: state.clone(),
        }
    }
}

/// Publishes turn outcomes to a real-time room.
#[async_trait]
pub trait Signaler: Send + Sync {
    async fn publish(&self, room: &str, signal: &IntentSignal) -> Result<(), VoiceError>;
}

/// LiveKit server-API client: issues join tokens and sends data messages.
#[derive(Debug)]
pub struct VoiceService {
    config: LiveKitConfig,
    room_client: RoomClient,
}

impl VoiceService {
    pub fn new(config: LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.url, &config.api_key, &config.api_secret);
        Self {
            config,
            room_client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.url.is_empty()
    }

    pub fn get_url(&self) -> &str {
        &self.config.url
    }

    /// Issues a join token for `room_name`. The caller's phone is the
    /// participant identity.
    pub fn generate_join_token(
        &self,
        room_name: &str,
        participant_identity: &str,
        participant_name: &str,
    ) -> Result<String, VoiceError> {
        if self.config.api_key.is_empty() || self.config.api_secret.is_empty() {
            return Err(VoiceError::Config(
                "LiveKit API key and secret are required to issue tokens".to_string(),
            ));
        }

        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(participant_identity)
            .with_name(participant_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: Some(true),
                can_subscribe: Some(true),
                can_publish_data: Some(true),
                ..Default::default()
            })
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        token.to_jwt().map_err(VoiceError::LiveKit)
    }
}

#[async_trait]
impl Signaler for VoiceService {
    async fn publish(&self, room: &str, signal: &IntentSignal) -> Result<(), VoiceError> {
        if !self.is_enabled() {
            return Err(VoiceError::Config("LiveKit URL is not configured".to_string()));
        }

        let payload = serde_json::to_vec(signal)
            .map_err(|e| VoiceError::Signal(format!("failed to encode signal: {}", e)))?;

        // The default packet kind is reliable.
        let options = SendDataOptions {
            topic: Some(SIGNAL_TOPIC.to_string()),
            ..Default::default()
        };

        self.room_client
            .send_data(room, payload, options)
            .await
            .map_err(|e| VoiceError::Signal(e.to_string()))?;

        tracing::debug!(room, intent = %signal.intent, "sent intent signal");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raahi_types::UserInfo;

    #[test]
    fn signal_carries_intent_audio_and_state() {
        let mut state = TripState::initial(UserInfo::new("u1", "Asha", "9999999999"));
        state.intent = Intent::AskSource;

        let signal = IntentSignal::new("response_1.wav", "Where should I pick you up?", &state);
        let json = serde_json::to_value(&signal).unwrap();

        assert_eq!(json["type"], "intent");
        assert_eq!(json["intent"], "ask_source");
        assert_eq!(json["audioFile"], "response_1.wav");
        assert_eq!(json["audioUrl"], "/audio/response_1.wav");
        assert_eq!(json["text"], "Where should I pick you up?");
        assert_eq!(json["tripState"]["user"]["phone"], "9999999999");
    }
}
