use raahi_types::{room_name, TripState, UserInfo};
use raahi_voice::{IntentSignal, LiveKitConfig, Signaler, VoiceError, VoiceService};

const DEFAULT_URL: &str = "http://localhost:7880";
const DEFAULT_KEY: &str = "devkey";
const DEFAULT_SECRET: &str = "secret";

#[tokio::test]
async fn test_generate_join_token() {
    let config = LiveKitConfig::new(DEFAULT_URL, DEFAULT_KEY, DEFAULT_SECRET);
    let service = VoiceService::new(config);

    let token = service
        .generate_join_token(&room_name("9999999999"), "9999999999", "Asha")
        .expect("Failed to generate token");

    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_token_permissions() {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use serde::Deserialize;

    let config = LiveKitConfig::new(DEFAULT_URL, DEFAULT_KEY, DEFAULT_SECRET);
    let service = VoiceService::new(config);

    let token = service
        .generate_join_token("trip_9999999999", "9999999999", "Asha")
        .expect("Failed to generate token");

    #[derive(Deserialize)]
    struct Claims {
        sub: String,
        video: VideoClaims,
    }

    #[derive(Deserialize)]
    struct VideoClaims {
        room: String,
        #[serde(rename = "canPublish")]
        can_publish: bool,
        #[serde(rename = "canSubscribe")]
        can_subscribe: bool,
        #[serde(rename = "canPublishData")]
        can_publish_data: bool,
        #[serde(rename = "roomJoin")]
        room_join: bool,
    }

    let validation = Validation::new(Algorithm::HS256);
    let key = DecodingKey::from_secret(DEFAULT_SECRET.as_bytes());
    let token_data = decode::<Claims>(&token, &key, &validation).expect("Failed to decode token");

    assert_eq!(token_data.claims.sub, "9999999999");
    assert_eq!(token_data.claims.video.room, "trip_9999999999");
    assert!(token_data.claims.video.can_publish);
    assert!(token_data.claims.video.can_subscribe);
    assert!(token_data.claims.video.can_publish_data);
    assert!(token_data.claims.video.room_join);
}

#[tokio::test]
async fn test_token_requires_credentials() {
    let service = VoiceService::new(LiveKitConfig::new(DEFAULT_URL, "", ""));
    let result = service.generate_join_token("trip_1", "1", "One");
    assert!(matches!(result, Err(VoiceError::Config(_))));
}

#[tokio::test]
async fn test_publish_without_url_is_config_error() {
    let service = VoiceService::new(LiveKitConfig::default());
    assert!(!service.is_enabled());

    let state = TripState::initial(UserInfo::new("u1", "Asha", "9999999999"));
    let signal = IntentSignal::new("general.mp3", "Hello", &state);

    let result = service.publish("trip_9999999999", &signal).await;
    assert!(matches!(result, Err(VoiceError::Config(_))));
}

#[test]
fn test_livekit_config_toml() {
    let toml_str = r#"
        url = "ws://localhost:7880"
        api_key = "key"
        api_secret = "secret"
    "#;

    let config: LiveKitConfig = toml::from_str(toml_str).expect("parse TOML");
    assert_eq!(config.url, "ws://localhost:7880");
    assert_eq!(config.token_ttl_seconds, 3600);
}
