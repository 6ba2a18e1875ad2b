//! Knowledge ingestion endpoint.

use crate::api::ApiError;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::Extension;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
}

/// Handler for `POST /ingest`.
///
/// Upserts `{id, text}` into the knowledge index. Re-ingesting an id
/// replaces its text.
pub async fn ingest_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::BadRequest("Invalid JSON".to_string()))?;

    let id = payload.id.trim();
    if id.is_empty() || payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing id or text".to_string()));
    }

    state
        .knowledge
        .upsert(id, &payload.text)
        .await
        .map_err(|e| {
            tracing::error!(id, error = %e, "failed to ingest document");
            ApiError::InternalServerError(e.to_string())
        })?;

    tracing::info!(id, "ingested knowledge document");
    Ok(Json(json!({ "success": true })))
}
