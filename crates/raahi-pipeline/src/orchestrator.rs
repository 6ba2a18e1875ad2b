use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use raahi_knowledge::KnowledgeIndex;
use raahi_reasoning::Reasoner;
use raahi_session::SessionStore;
use raahi_types::voice::locale_for_text;
use raahi_types::{
    contains_devanagari, room_name, Intent, Language, TripState, UserInfo,
    CONTEXT_DOCUMENTS_PER_TURN, SESSION_TTL_SECONDS,
};
use raahi_voice::{IntentSignal, Signaler, Synthesizer, Transcriber};
use serde::Serialize;

use crate::booking::TripBooker;
use crate::error::TurnError;
use crate::lock::TurnLocks;

/// Spoken when the reasoner produced no reply text.
pub const FALLBACK_REPLY: &str = "Okay.";

/// Audio reference returned when synthesis fails.
pub const DEFAULT_AUDIO_FILE: &str = "general.mp3";

const BOOKED_EN: &str = "Great! I have created your trip. Have a safe journey.";
const BOOKED_HI: &str = "बहुत बढ़िया! मैंने आपकी यात्रा तैयार कर दी है। आपकी यात्रा मंगलमय हो।";
const BOOKING_FAILED_EN: &str =
    "I tried to book your trip but faced a technical issue. Please try again.";
const BOOKING_FAILED_HI: &str =
    "मैंने आपकी यात्रा बुक करने की कोशिश की, लेकिन एक तकनीकी समस्या आ गई। कृपया फिर से कोशिश करें।";

/// Per-call timeouts and turn constants.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub session_ttl: Duration,
    pub context_documents: usize,
    pub default_audio: String,
    pub store_timeout: Duration,
    pub stt_timeout: Duration,
    pub reasoning_timeout: Duration,
    pub booking_timeout: Duration,
    pub tts_timeout: Duration,
    pub signal_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(SESSION_TTL_SECONDS),
            context_documents: CONTEXT_DOCUMENTS_PER_TURN,
            default_audio: DEFAULT_AUDIO_FILE.to_string(),
            store_timeout: Duration::from_secs(5),
            stt_timeout: Duration::from_secs(120),
            reasoning_timeout: Duration::from_secs(30),
            booking_timeout: Duration::from_secs(10),
            tts_timeout: Duration::from_secs(60),
            signal_timeout: Duration::from_secs(5),
        }
    }
}

/// One caller utterance.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub audio: Vec<u8>,
    pub mime_type: String,
    pub caller_name: String,
    pub caller_id: String,
    pub phone: String,
}

/// What the booking gate did this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingOutcome {
    NotRequested,
    /// Booking was requested but the trip already exists for this session.
    AlreadyCreated,
    Created,
    Failed,
    /// Booking was requested with a mandatory slot still empty.
    SlotsIncomplete,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub trip_state: TripState,
    pub transcript: String,
    pub audio_file: String,
    pub booking: BookingOutcome,
}

/// Enforces the state-machine invariants on a reasoner's candidate.
///
/// The bound user and the created flag come from `current`, so only a
/// successful booking can set `trip_created`; a one-way
/// trip's end date is inferred; `CreateTrip` with an empty mandatory slot is
/// turned back into the question for that slot.
pub fn normalize_candidate(mut candidate: TripState, current: &TripState) -> TripState {
    candidate.user = current.user.clone();
    candidate.trip_created = current.trip_created;
    candidate.infer_one_way_end_date();

    if candidate.intent == Intent::CreateTrip {
        if let Some(slot) = candidate.first_missing_slot() {
            tracing::warn!(
                phone = %candidate.user.phone,
                ?slot,
                "create_trip requested with a missing slot, asking for it instead"
            );
            candidate.intent = slot.ask_intent();
        }
    }
    candidate
}

fn speaks_hindi(state: &TripState) -> bool {
    state.preferences.language == Language::Hindi || contains_devanagari(&state.agent_response)
}

/// Wires the turn pipeline's collaborators together.
pub struct Orchestrator {
    sessions: Arc<dyn SessionStore>,
    knowledge: KnowledgeIndex,
    transcriber: Arc<dyn Transcriber>,
    reasoner: Arc<dyn Reasoner>,
    booker: Arc<dyn TripBooker>,
    synthesizer: Arc<dyn Synthesizer>,
    signaler: Arc<dyn Signaler>,
    settings: PipelineSettings,
    locks: TurnLocks,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        knowledge: KnowledgeIndex,
        transcriber: Arc<dyn Transcriber>,
        reasoner: Arc<dyn Reasoner>,
        booker: Arc<dyn TripBooker>,
        synthesizer: Arc<dyn Synthesizer>,
        signaler: Arc<dyn Signaler>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            sessions,
            knowledge,
            transcriber,
            reasoner,
            booker,
            synthesizer,
            signaler,
            settings,
            locks: TurnLocks::new(),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn knowledge(&self) -> &KnowledgeIndex {
        &self.knowledge
    }

    /// Runs one conversation turn for `request.phone`.
    ///
    /// Turns for the same phone run one at a time. On error nothing has been
    /// written to the session store.
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnOutcome, TurnError> {
        let phone = request.phone.trim().to_string();
        if phone.is_empty() {
            return Err(TurnError::InvalidRequest("phone is required".to_string()));
        }

        let _turn = self.locks.acquire(&phone).await;
        let settings = &self.settings;

        let current = match bounded("session load", settings.store_timeout, self.sessions.get(&phone))
            .await?
        {
            Some(state) => state,
            None => {
                tracing::info!(%phone, "starting new session");
                TripState::initial(UserInfo::new(
                    request.caller_id.clone(),
                    request.caller_name.clone(),
                    phone.clone(),
                ))
            }
        };

        let transcript = bounded(
            "transcription",
            settings.stt_timeout,
            self.transcriber.transcribe(&request.audio, &request.mime_type),
        )
        .await?;
        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            return Err(TurnError::EmptyTranscript);
        }
        tracing::info!(%phone, %transcript, "transcribed utterance");

        let context = self
            .knowledge
            .search(&transcript, settings.context_documents)
            .await;

        let candidate = bounded(
            "reasoning",
            settings.reasoning_timeout,
            self.reasoner.reason(&transcript, &current, &context),
        )
        .await?;

        let booking_requested = candidate.intent == Intent::CreateTrip;
        let mut next = normalize_candidate(candidate, &current);
        let booking = if booking_requested && next.intent != Intent::CreateTrip {
            BookingOutcome::SlotsIncomplete
        } else {
            self.booking_gate(&mut next).await
        };

        bounded(
            "session save",
            settings.store_timeout,
            self.sessions.put(&phone, &next, settings.session_ttl),
        )
        .await?;

        let text = if next.has_response() {
            next.agent_response.clone()
        } else {
            FALLBACK_REPLY.to_string()
        };
        let audio_file = self.speak(&phone, &text).await;
        self.notify(&phone, &audio_file, &text, &next).await;

        tracing::info!(
            %phone,
            intent = %next.intent,
            trip_created = next.trip_created,
            ?booking,
            "turn complete"
        );

        Ok(TurnOutcome {
            trip_state: next,
            transcript,
            audio_file,
            booking,
        })
    }

    /// Books the trip at most once per session.
    async fn booking_gate(&self, next: &mut TripState) -> BookingOutcome {
        if next.intent != Intent::CreateTrip {
            return BookingOutcome::NotRequested;
        }
        if next.trip_created {
            tracing::debug!(phone = %next.user.phone, "trip already created, skipping booking");
            return BookingOutcome::AlreadyCreated;
        }

        let hindi = speaks_hindi(next);
        let result = tokio::time::timeout(
            self.settings.booking_timeout,
            self.booker.create_trip(next),
        )
        .await;

        match result {
            Ok(Ok(())) => {
                tracing::info!(phone = %next.user.phone, "trip booked");
                next.trip_created = true;
                if !next.has_response() {
                    next.agent_response = if hindi { BOOKED_HI } else { BOOKED_EN }.to_string();
                }
                BookingOutcome::Created
            }
            Ok(Err(e)) => {
                tracing::error!(phone = %next.user.phone, error = %e, "booking failed");
                next.trip_created = false;
                next.agent_response =
                    if hindi { BOOKING_FAILED_HI } else { BOOKING_FAILED_EN }.to_string();
                BookingOutcome::Failed
            }
            Err(_) => {
                tracing::error!(
                    phone = %next.user.phone,
                    timeout = ?self.settings.booking_timeout,
                    "booking timed out"
                );
                next.trip_created = false;
                next.agent_response =
                    if hindi { BOOKING_FAILED_HI } else { BOOKING_FAILED_EN }.to_string();
                BookingOutcome::Failed
            }
        }
    }

    /// Synthesizes the reply, falling back to the shared default audio.
    async fn speak(&self, phone: &str, text: &str) -> String {
        let locale = locale_for_text(text);
        match tokio::time::timeout(
            self.settings.tts_timeout,
            self.synthesizer.synthesize(text, locale),
        )
        .await
        {
            Ok(Ok(file)) => file,
            Ok(Err(e)) => {
                tracing::warn!(%phone, error = %e, "synthesis failed, using default audio");
                self.settings.default_audio.clone()
            }
            Err(_) => {
                tracing::warn!(%phone, "synthesis timed out, using default audio");
                self.settings.default_audio.clone()
            }
        }
    }

    async fn notify(&self, phone: &str, audio_file: &str, text: &str, state: &TripState) {
        let room = room_name(phone);
        let signal = IntentSignal::new(audio_file, text, state);
        match tokio::time::timeout(
            self.settings.signal_timeout,
            self.signaler.publish(&room, &signal),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(%room, error = %e, "failed to signal room"),
            Err(_) => tracing::warn!(%room, "signaling timed out"),
        }
    }
}

/// Awaits `fut` for at most `after`, folding its error into [`TurnError`].
async fn bounded<T, E, F>(stage: &'static str, after: Duration, fut: F) -> Result<T, TurnError>
where
    F: Future<Output = Result<T, E>>,
    TurnError: From<E>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result.map_err(TurnError::from),
        Err(_) => Err(TurnError::Timeout { stage, after }),
    }
}
