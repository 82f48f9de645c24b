use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatApiRequest {
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatApiResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

pub async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatApiRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = payload
        .session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Session ID is required".to_string()))?;

    let message = payload.message.unwrap_or_default();

    let reply = state.dialog.handle(&session_id, &message).await?;

    Ok(Json(ChatApiResponse {
        message: reply.message,
        options: reply.options,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResetApiResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub message: String,
}

/// Hands the client a fresh session key with the greeting already played.
pub async fn reset_chat(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let (session_id, reply) = state.dialog.reset().await;

    Ok(Json(ResetApiResponse {
        session_id,
        message: reply.message,
    }))
}
