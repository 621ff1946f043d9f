//! Question answering endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{Answer, ChatMessage};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: Answer,
    /// Full history after this exchange
    pub messages: Vec<ChatMessage>,
}

/// POST /api/sessions/:id/chat - Ask a question about the processed documents
pub async fn chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let handle = state.session(id)?;
    let mut session = handle.lock().await;

    let answer = session.ask(&request.question).await?;
    tracing::info!(
        "Session {} answered in {}ms with {} sources",
        id,
        answer.processing_time_ms,
        answer.sources.len()
    );

    Ok(Json(ChatResponse {
        answer,
        messages: session.messages().to_vec(),
    }))
}
