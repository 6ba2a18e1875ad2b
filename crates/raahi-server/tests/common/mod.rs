#![allow(dead_code)]

use async_trait::async_trait;
use raahi_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use raahi_knowledge::{Embedder, KnowledgeError, KnowledgeIndex};
use raahi_pipeline::{BookingError, Orchestrator, PipelineSettings, TripBooker};
use raahi_reasoning::{Reasoner, ReasoningError};
use raahi_server::{app, AppState};
use raahi_session::SqliteSessionStore;
use raahi_types::{Intent, TripState};
use raahi_voice::{
    IntentSignal, LiveKitConfig, Signaler, Synthesizer, Transcriber, VoiceError, VoiceService,
};
use std::sync::Arc;
use std::time::Duration;

pub const BOUNDARY: &str = "raahi-test-boundary";

pub struct WordEmbedder;

#[async_trait]
impl Embedder for WordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let mut v = vec![0.0; 4];
        for word in text.split_whitespace() {
            v[word.len() % 4] += 1.0;
        }
        Ok(v)
    }
}

pub struct DownEmbedder;

#[async_trait]
impl Embedder for DownEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, KnowledgeError> {
        Err(KnowledgeError::Embedding("connection refused".to_string()))
    }
}

struct HelloTranscriber;

#[async_trait]
impl Transcriber for HelloTranscriber {
    async fn transcribe(&self, _audio: &[u8], _mime: &str) -> Result<String, VoiceError> {
        Ok("Hello".to_string())
    }
}

/// Greets on every turn, or fails when `fail` is set.
struct GreetingReasoner {
    fail: bool,
}

#[async_trait]
impl Reasoner for GreetingReasoner {
    async fn reason(
        &self,
        _transcript: &str,
        current: &TripState,
        _context: &str,
    ) -> Result<TripState, ReasoningError> {
        if self.fail {
            return Err(ReasoningError::Status {
                status: 503,
                body: "overloaded".to_string(),
            });
        }
        let mut next = current.clone();
        next.intent = Intent::Greet;
        next.agent_response = "Namaste!".to_string();
        Ok(next)
    }
}

struct NoBooking;

#[async_trait]
impl TripBooker for NoBooking {
    async fn create_trip(&self, _state: &TripState) -> Result<(), BookingError> {
        Ok(())
    }
}

struct FileSynthesizer;

#[async_trait]
impl Synthesizer for FileSynthesizer {
    async fn synthesize(&self, _text: &str, _locale: &str) -> Result<String, VoiceError> {
        Ok("response_test.wav".to_string())
    }
}

struct SilentSignaler;

#[async_trait]
impl Signaler for SilentSignaler {
    async fn publish(&self, _room: &str, _signal: &IntentSignal) -> Result<(), VoiceError> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: axum::Router,
    pub pool: DbPool,
    pub knowledge: KnowledgeIndex,
    pub dir: tempfile::TempDir,
}

pub struct Setup {
    pub embedder: Arc<dyn Embedder>,
    pub reasoning_fails: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            embedder: Arc::new(WordEmbedder),
            reasoning_fails: false,
        }
    }
}

pub fn setup_app(setup: Setup) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("raahi.db");
    let pool = create_pool(db_path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    run_migrations(&pool.get().unwrap()).unwrap();

    let audio_dir = dir.path().join("audio");
    std::fs::create_dir_all(&audio_dir).unwrap();
    std::fs::write(audio_dir.join("general.mp3"), b"ID3-default-audio").unwrap();

    let knowledge = KnowledgeIndex::new(pool.clone(), setup.embedder, 4, Duration::from_secs(1));
    let orchestrator = Orchestrator::new(
        Arc::new(SqliteSessionStore::new(pool.clone())),
        knowledge.clone(),
        Arc::new(HelloTranscriber),
        Arc::new(GreetingReasoner {
            fail: setup.reasoning_fails,
        }),
        Arc::new(NoBooking),
        Arc::new(FileSynthesizer),
        Arc::new(SilentSignaler),
        PipelineSettings::default(),
    );

    // Token generation is local; no LiveKit server is needed.
    let voice_service = VoiceService::new(LiveKitConfig::new(
        "http://localhost:7880",
        "devkey",
        "devsecret",
    ));

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        knowledge: knowledge.clone(),
        voice_service: Arc::new(voice_service),
        audio_dir,
    };

    TestApp {
        router: app(state),
        pool,
        knowledge,
        dir,
    }
}

/// Encodes a multipart/form-data body with text fields and an optional file.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((mime, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"clip.webm\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
