//! API routes for the chat server

pub mod chat;
pub mod documents;
pub mod sessions;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post, put},
    Json, Router,
};

use crate::error::Result;
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Sessions
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/:id/language", put(sessions::select_language))
        // Processing - with larger body limit for file uploads
        .route(
            "/sessions/:id/documents",
            post(documents::process_documents).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Chat
        .route("/sessions/:id/chat", post(chat::chat))
        // Info
        .route("/languages", get(sessions::list_languages))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let service = state.service();
    let store = service.store_info().await?.map(|info| {
        serde_json::json!({
            "language": info.language,
            "embedding_model": info.embedding_model,
            "dimensions": info.dimensions,
            "chunks": info.chunk_count,
            "created_at": info.created_at,
        })
    });

    Ok(Json(serde_json::json!({
        "name": "pdf-chat",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Chat with your PDFs using retrieval-augmented generation",
        "languages": service.languages().languages(),
        "generation_model": service.generator_model(),
        "chunking": {
            "chunk_size": service.config().chunking.chunk_size,
            "chunk_overlap": service.config().chunking.chunk_overlap,
        },
        "top_k": service.config().retrieval.top_k,
        "vector_store": store,
        "active_sessions": state.session_count(),
        "started_at": state.started_at(),
        "endpoints": {
            "POST /api/sessions": "Start a session",
            "GET /api/sessions/:id": "Session state and chat history",
            "DELETE /api/sessions/:id": "End a session",
            "PUT /api/sessions/:id/language": "Select the document language",
            "POST /api/sessions/:id/documents": "Upload and process PDFs (multipart)",
            "POST /api/sessions/:id/chat": "Ask a question",
            "GET /api/languages": "Supported languages"
        }
    })))
}
