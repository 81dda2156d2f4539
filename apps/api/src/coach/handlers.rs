//! Axum route handler for the coach chat endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coach::chat::{chat_with_coach, ChatMessage};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /api/v1/chat
///
/// One coach turn: bounded recent history plus the new message, with the
/// session's full collections bound to the lookup tools.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let session = state.sessions.get(req.user_id).await?;
    let (entries, reminders) = {
        let store = session.lock().await;
        (store.entries().to_vec(), store.reminders().to_vec())
    };

    let response =
        chat_with_coach(&state.llm, &req.history, &req.message, &entries, &reminders).await?;
    Ok(Json(ChatResponse { response }))
}
