//! Conversation turn endpoint.

use crate::api::ApiError;
use crate::AppState;
use axum::extract::{Extension, Multipart};
use axum::Json;
use raahi_pipeline::TurnRequest;
use raahi_types::TripState;
use raahi_voice::MAX_STT_INPUT_BYTES;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeResponse {
    pub success: bool,
    pub trip_state: TripState,
}

/// Handler for `POST /transcribe`.
///
/// Multipart fields: `file` (the recorded utterance), `phone`, and optional
/// `name` and `id`. The turn runs on its own task, so a caller that hangs up
/// mid-turn does not cancel booking or persistence.
pub async fn transcribe_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut audio: Option<(Vec<u8>, String)> = None;
    let mut name = String::new();
    let mut phone = String::new();
    let mut caller_id = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {}", e)))?;
                audio = Some((data.to_vec(), mime_type));
            }
            "name" | "phone" | "id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("invalid {} field: {}", field_name, e)))?;
                let value = value.trim().to_string();
                match field_name.as_str() {
                    "name" => name = value,
                    "phone" => phone = value,
                    _ => caller_id = value,
                }
            }
            _ => {}
        }
    }

    let (audio, mime_type) = audio
        .filter(|(data, _)| !data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Audio file is required".to_string()))?;
    if audio.len() > MAX_STT_INPUT_BYTES {
        return Err(ApiError::BadRequest(format!(
            "audio too large: {} bytes (max {})",
            audio.len(),
            MAX_STT_INPUT_BYTES
        )));
    }
    if phone.is_empty() {
        return Err(ApiError::BadRequest("Phone required".to_string()));
    }

    tracing::debug!(%phone, bytes = audio.len(), %mime_type, "received utterance");

    let request = TurnRequest {
        audio,
        mime_type,
        caller_name: name,
        caller_id,
        phone,
    };

    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move { orchestrator.run_turn(request).await })
        .await
        .map_err(|e| ApiError::InternalServerError(format!("turn task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!(error = %e, "turn failed");
            ApiError::from(e)
        })?;

    Ok(Json(TranscribeResponse {
        success: true,
        trip_state: outcome.trip_state,
    }))
}
