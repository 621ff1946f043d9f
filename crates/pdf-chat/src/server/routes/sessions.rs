//! Session lifecycle and language selection

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::session::SessionView;
use crate::types::Language;

#[derive(Debug, Deserialize)]
pub struct SelectLanguageRequest {
    /// Language name or tag, e.g. "English", "fa"
    pub language: String,
}

/// POST /api/sessions - Start a session
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let (_, handle) = state.create_session();
    let view = handle.lock().await.view();
    (StatusCode::CREATED, Json(view))
}

/// GET /api/sessions/:id - Session state and chat history
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let handle = state.session(id)?;
    let view = handle.lock().await.view();
    Ok(Json(view))
}

/// DELETE /api/sessions/:id - End a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.remove_session(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/sessions/:id/language - Choose the document language
pub async fn select_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectLanguageRequest>,
) -> Result<Json<SessionView>> {
    let (language, _) = state.service().languages().resolve(&request.language)?;
    let handle = state.session(id)?;
    let mut session = handle.lock().await;
    session.select_language(language);
    Ok(Json(session.view()))
}

/// GET /api/languages - Languages with a configured profile
pub async fn list_languages(State(state): State<AppState>) -> Json<serde_json::Value> {
    let languages: Vec<serde_json::Value> = state
        .service()
        .languages()
        .languages()
        .into_iter()
        .filter_map(|language: Language| {
            let profile = state.service().languages().get(language).ok()?;
            Some(serde_json::json!({
                "language": language,
                "name": language.display_name(),
                "embedding_model": profile.embedding_model,
            }))
        })
        .collect();
    Json(serde_json::json!({ "languages": languages }))
}
