//! Raahi server binary.
//!
//! Builds every client once, wires them into the turn orchestrator, and
//! serves the HTTP API with structured logging and graceful shutdown on
//! SIGTERM/SIGINT.

use raahi_knowledge::{HttpEmbedder, KnowledgeIndex};
use raahi_pipeline::{HttpBooker, Orchestrator, PipelineSettings};
use raahi_reasoning::HttpReasoner;
use raahi_server::config::{self, Config};
use raahi_server::{app, background, AppState};
use raahi_session::SqliteSessionStore;
use raahi_voice::{SttService, TtsService, VoiceService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("RAAHI_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration: the server cannot start without valid config");

    init_tracing(&config);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize database
    let pool = raahi_db::create_pool(
        &config.database.path,
        raahi_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
            checkout_timeout_ms: config.database.checkout_timeout_ms,
        },
    )
    .expect("failed to create database pool; check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied = raahi_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    let timeouts = &config.timeouts;
    let sessions = SqliteSessionStore::new(pool.clone());

    let embedder = HttpEmbedder::new(
        &config.knowledge.embedding_url,
        &config.knowledge.embedding_model,
        config.knowledge.embedding_api_key.clone(),
        timeouts.embedding(),
    )
    .expect("failed to build embedding client");
    let knowledge = KnowledgeIndex::new(
        pool.clone(),
        Arc::new(embedder),
        config.knowledge.dimension,
        timeouts.embedding(),
    );

    let stt = SttService::new(&config.voice.stt_model, &config.voice.stt_binary)
        .with_timeout(timeouts.stt());

    let audio_dir = PathBuf::from(&config.voice.audio_dir);
    std::fs::create_dir_all(&audio_dir).expect("failed to create audio directory");
    if !audio_dir.join(&config.voice.default_audio).exists() {
        tracing::warn!(
            path = %audio_dir.join(&config.voice.default_audio).display(),
            "default audio file is missing; clients will get 404 when synthesis fails"
        );
    }

    let tts = TtsService::new(
        &config.voice.voices_dir,
        &config.voice.piper_binary,
        &audio_dir,
    )
    .with_timeout(timeouts.tts());
    for profile in &config.voice.profiles {
        tts.add_profile(profile.clone()).await;
    }

    let reasoner = HttpReasoner::new(
        &config.reasoning.url,
        &config.reasoning.model,
        config.reasoning.api_key.clone(),
        timeouts.reasoning(),
    )
    .expect("failed to build reasoning client");

    let booker = HttpBooker::new(&config.booking.url, timeouts.booking())
        .expect("failed to build booking client");

    let voice_service = Arc::new(VoiceService::new(config.livekit.clone()));
    if !voice_service.is_enabled() {
        tracing::warn!("livekit.url is not set; intent signals will not be delivered");
    }

    let settings = PipelineSettings {
        session_ttl: Duration::from_secs(config.session.ttl_seconds),
        context_documents: config.knowledge.top_k,
        default_audio: config.voice.default_audio.clone(),
        store_timeout: timeouts.store(),
        stt_timeout: timeouts.stt(),
        reasoning_timeout: timeouts.reasoning(),
        booking_timeout: timeouts.booking(),
        tts_timeout: timeouts.tts(),
        signal_timeout: timeouts.signal(),
    };

    let orchestrator = Orchestrator::new(
        Arc::new(sessions.clone()),
        knowledge.clone(),
        Arc::new(stt),
        Arc::new(reasoner),
        Arc::new(booker),
        Arc::new(tts),
        voice_service.clone(),
        settings,
    );

    background::seed_knowledge(&knowledge, &config.knowledge.seed_documents).await;
    tokio::spawn(background::start_session_purge_task(
        sessions,
        config.session.purge_interval_seconds,
    ));

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        knowledge,
        voice_service,
        audio_dir,
    };

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting raahi server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("raahi server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
