use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use raahi_types::TripState;
use serde::{Deserialize, Serialize};

use crate::error::ReasoningError;
use crate::parse::parse_candidate;
use crate::prompt::{build_turn_message, current_ist, SYSTEM_PROMPT};

/// Produces the candidate next state for a turn.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn reason(
        &self,
        transcript: &str,
        current: &TripState,
        context: &str,
    ) -> Result<TripState, ReasoningError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Reasoner backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct HttpReasoner {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpReasoner {
    /// Builds a reasoner whose every request is bounded by `timeout`.
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReasoningError::Request(format!("failed to build client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl Reasoner for HttpReasoner {
    async fn reason(
        &self,
        transcript: &str,
        current: &TripState,
        context: &str,
    ) -> Result<TripState, ReasoningError> {
        let today = current_ist(Utc::now());
        let turn = build_turn_message(&today, transcript, current, context)
            .map_err(|e| ReasoningError::Request(format!("failed to encode state: {}", e)))?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &turn,
                },
            ],
            temperature: 0.0,
            max_tokens: MAX_OUTPUT_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReasoningError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::Request(format!("invalid response body: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ReasoningError::EmptyResponse)?;

        tracing::debug!(bytes = content.len(), "reasoning response received");
        parse_candidate(&content, current)
    }
}
