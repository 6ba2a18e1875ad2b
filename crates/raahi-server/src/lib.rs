//! Raahi server library logic.

pub mod api;
pub mod api_ingest;
pub mod api_token;
pub mod api_transcribe;
pub mod background;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
    Extension, Json, Router,
};
use raahi_knowledge::KnowledgeIndex;
use raahi_pipeline::Orchestrator;
use raahi_voice::{VoiceService, MAX_STT_INPUT_BYTES};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runs conversation turns.
    pub orchestrator: Arc<Orchestrator>,
    /// Knowledge index, for ingestion.
    pub knowledge: KnowledgeIndex,
    /// Issues LiveKit join tokens.
    pub voice_service: Arc<VoiceService>,
    /// Directory served at `/audio`.
    pub audio_dir: PathBuf,
}

/// Maximum request body size for JSON endpoints (2 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Multipart framing and text fields on top of the audio itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let turn_routes = Router::new()
        .route("/transcribe", post(api_transcribe::transcribe_handler))
        .layer(DefaultBodyLimit::max(
            MAX_STT_INPUT_BYTES + MULTIPART_OVERHEAD_BYTES,
        ));

    let router = Router::new()
        .route("/health", get(health))
        .route("/ingest", post(api_ingest::ingest_handler))
        .route("/token", get(api_token::token_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .merge(turn_routes)
        .nest_service("/audio", ServeDir::new(&state.audio_dir));

    router
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
