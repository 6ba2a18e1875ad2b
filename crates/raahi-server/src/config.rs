//! Server configuration loading from file and environment variables.

use raahi_pipeline::{DEFAULT_AUDIO_FILE, DEFAULT_BOOKING_URL};
use raahi_types::voice::VoiceProfile;
use raahi_types::{CONTEXT_DOCUMENTS_PER_TURN, SESSION_TTL_SECONDS};
use raahi_voice::LiveKitConfig;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub reasoning: ReasoningConfig,

    #[serde(default)]
    pub booking: BookingConfig,

    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub livekit: LiveKitConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,

    /// How long a request waits for a pooled connection.
    #[serde(default = "default_checkout_timeout_ms")]
    pub checkout_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "raahi_pipeline=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which a caller's session is forgotten.
    #[serde(default = "default_session_ttl_seconds")]
    pub ttl_seconds: u64,

    /// How often expired rows are deleted. 0 disables the purge task.
    #[serde(default = "default_purge_interval_seconds")]
    pub purge_interval_seconds: u64,
}

/// A document upserted into the knowledge index at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedDocument {
    pub id: String,
    pub text: String,
}

#[derive(Clone, Deserialize)]
pub struct KnowledgeConfig {
    /// OpenAI-compatible embeddings endpoint.
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default)]
    pub embedding_api_key: Option<String>,

    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Documents retrieved per turn.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_seed_documents")]
    pub seed_documents: Vec<SeedDocument>,
}

#[derive(Clone, Deserialize)]
pub struct ReasoningConfig {
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_reasoning_url")]
    pub url: String,

    #[serde(default = "default_reasoning_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    #[serde(default = "default_booking_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// whisper.cpp-compatible binary.
    #[serde(default = "default_stt_binary")]
    pub stt_binary: String,

    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    #[serde(default = "default_piper_binary")]
    pub piper_binary: String,

    /// Directory voice model paths are resolved against.
    #[serde(default = "default_voices_dir")]
    pub voices_dir: String,

    /// Where synthesized replies are written and served from at `/audio`.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,

    /// Audio file returned when synthesis fails. Lives in `audio_dir`.
    #[serde(default = "default_audio")]
    pub default_audio: String,

    #[serde(default = "VoiceProfile::defaults")]
    pub profiles: Vec<VoiceProfile>,
}

/// Bounds on every external call a turn makes.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_store_ms")]
    pub store_ms: u64,

    #[serde(default = "default_stt_seconds")]
    pub stt_seconds: u64,

    #[serde(default = "default_embedding_ms")]
    pub embedding_ms: u64,

    #[serde(default = "default_reasoning_seconds")]
    pub reasoning_seconds: u64,

    #[serde(default = "default_booking_seconds")]
    pub booking_seconds: u64,

    #[serde(default = "default_tts_seconds")]
    pub tts_seconds: u64,

    #[serde(default = "default_signal_seconds")]
    pub signal_seconds: u64,
}

impl TimeoutConfig {
    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }

    pub fn stt(&self) -> Duration {
        Duration::from_secs(self.stt_seconds)
    }

    pub fn embedding(&self) -> Duration {
        Duration::from_millis(self.embedding_ms)
    }

    pub fn reasoning(&self) -> Duration {
        Duration::from_secs(self.reasoning_seconds)
    }

    pub fn booking(&self) -> Duration {
        Duration::from_secs(self.booking_seconds)
    }

    pub fn tts(&self) -> Duration {
        Duration::from_secs(self.tts_seconds)
    }

    pub fn signal(&self) -> Duration {
        Duration::from_secs(self.signal_seconds)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "raahi.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_checkout_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl_seconds() -> u64 {
    SESSION_TTL_SECONDS
}

fn default_purge_interval_seconds() -> u64 {
    60
}

fn default_embedding_url() -> String {
    "http://localhost:11434/v1/embeddings".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimension() -> usize {
    raahi_knowledge::DEFAULT_DIMENSION
}

fn default_top_k() -> usize {
    CONTEXT_DOCUMENTS_PER_TURN
}

fn default_seed_documents() -> Vec<SeedDocument> {
    vec![
        SeedDocument {
            id: "pricing_suv".to_string(),
            text: "SUV costs 18rs/km.".to_string(),
        },
        SeedDocument {
            id: "pricing_sedan".to_string(),
            text: "Sedan costs 12rs/km.".to_string(),
        },
    ]
}

fn default_reasoning_url() -> String {
    "http://localhost:11434/v1/chat/completions".to_string()
}

fn default_reasoning_model() -> String {
    "llama3.1".to_string()
}

fn default_booking_url() -> String {
    DEFAULT_BOOKING_URL.to_string()
}

fn default_stt_binary() -> String {
    "whisper-cli".to_string()
}

fn default_stt_model() -> String {
    "models/ggml-base.bin".to_string()
}

fn default_piper_binary() -> String {
    "piper".to_string()
}

fn default_voices_dir() -> String {
    "assets/voices".to_string()
}

fn default_audio_dir() -> String {
    "audio".to_string()
}

fn default_audio() -> String {
    DEFAULT_AUDIO_FILE.to_string()
}

fn default_store_ms() -> u64 {
    5000
}

fn default_stt_seconds() -> u64 {
    120
}

fn default_embedding_ms() -> u64 {
    5000
}

fn default_reasoning_seconds() -> u64 {
    30
}

fn default_booking_seconds() -> u64 {
    10
}

fn default_tts_seconds() -> u64 {
    60
}

fn default_signal_seconds() -> u64 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
            checkout_timeout_ms: default_checkout_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl_seconds(),
            purge_interval_seconds: default_purge_interval_seconds(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_api_key: None,
            dimension: default_dimension(),
            top_k: default_top_k(),
            seed_documents: default_seed_documents(),
        }
    }
}

impl fmt::Debug for KnowledgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeConfig")
            .field("embedding_url", &self.embedding_url)
            .field("embedding_model", &self.embedding_model)
            .field(
                "embedding_api_key",
                &self.embedding_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("dimension", &self.dimension)
            .field("top_k", &self.top_k)
            .field("seed_documents", &self.seed_documents.len())
            .finish()
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            url: default_reasoning_url(),
            model: default_reasoning_model(),
            api_key: None,
        }
    }
}

impl fmt::Debug for ReasoningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasoningConfig")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            url: default_booking_url(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_binary: default_stt_binary(),
            stt_model: default_stt_model(),
            piper_binary: default_piper_binary(),
            voices_dir: default_voices_dir(),
            audio_dir: default_audio_dir(),
            default_audio: default_audio(),
            profiles: VoiceProfile::defaults(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store_ms: default_store_ms(),
            stt_seconds: default_stt_seconds(),
            embedding_ms: default_embedding_ms(),
            reasoning_seconds: default_reasoning_seconds(),
            booking_seconds: default_booking_seconds(),
            tts_seconds: default_tts_seconds(),
            signal_seconds: default_signal_seconds(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies `RAAHI_*` environment overrides.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Applies environment overrides read through `lookup`.
///
/// - `RAAHI_HOST`, `RAAHI_PORT` override `server.*`
/// - `RAAHI_DB_PATH` overrides `database.path`
/// - `RAAHI_LOG_LEVEL`, `RAAHI_LOG_JSON` override `logging.*`
/// - `RAAHI_EMBEDDING_URL`, `RAAHI_EMBEDDING_API_KEY` override `knowledge.*`
/// - `RAAHI_REASONING_URL`, `RAAHI_REASONING_MODEL`, `RAAHI_REASONING_API_KEY`
///   override `reasoning.*`
/// - `RAAHI_BOOKING_URL` overrides `booking.url`
/// - `RAAHI_AUDIO_DIR` overrides `voice.audio_dir`
/// - `RAAHI_LIVEKIT_URL`, `RAAHI_LIVEKIT_API_KEY`, `RAAHI_LIVEKIT_API_SECRET`
///   override `livekit.*`
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(host) = lookup("RAAHI_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("RAAHI_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = lookup("RAAHI_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = lookup("RAAHI_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("RAAHI_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(url) = lookup("RAAHI_EMBEDDING_URL") {
        config.knowledge.embedding_url = url;
    }
    if let Some(key) = lookup("RAAHI_EMBEDDING_API_KEY") {
        config.knowledge.embedding_api_key = Some(key);
    }
    if let Some(url) = lookup("RAAHI_REASONING_URL") {
        config.reasoning.url = url;
    }
    if let Some(model) = lookup("RAAHI_REASONING_MODEL") {
        config.reasoning.model = model;
    }
    if let Some(key) = lookup("RAAHI_REASONING_API_KEY") {
        config.reasoning.api_key = Some(key);
    }
    if let Some(url) = lookup("RAAHI_BOOKING_URL") {
        config.booking.url = url;
    }
    if let Some(dir) = lookup("RAAHI_AUDIO_DIR") {
        config.voice.audio_dir = dir;
    }
    if let Some(url) = lookup("RAAHI_LIVEKIT_URL") {
        config.livekit.url = url;
    }
    if let Some(key) = lookup("RAAHI_LIVEKIT_API_KEY") {
        config.livekit.api_key = key;
    }
    if let Some(secret) = lookup("RAAHI_LIVEKIT_API_SECRET") {
        config.livekit.api_secret = secret;
    }

    config
}
