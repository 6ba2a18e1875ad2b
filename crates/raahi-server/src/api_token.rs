//! LiveKit join token endpoint.

use crate::api::ApiError;
use crate::AppState;
use axum::extract::{Extension, Query};
use axum::Json;
use raahi_types::room_name;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub room_name: String,
}

/// Handler for `GET /token?name=&phone=`.
///
/// Issues a token for the caller's own room, `trip_<phone>`, where intent
/// signals are delivered.
pub async fn token_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, ApiError> {
    let phone = query
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Phone required".to_string()))?;
    let name = query
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "User".to_string());

    let room = room_name(&phone);
    let token = state
        .voice_service
        .generate_join_token(&room, &phone, &name)
        .map_err(|e| {
            tracing::error!(%room, error = %e, "failed to issue join token");
            ApiError::InternalServerError(e.to_string())
        })?;

    Ok(Json(TokenResponse {
        token,
        room_name: room,
    }))
}
