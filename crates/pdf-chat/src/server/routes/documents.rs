//! Document upload and processing endpoint

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{IngestReport, UploadedFile};

/// POST /api/sessions/:id/documents - Upload PDFs and process them
///
/// Every file field is part of the batch; other text fields are ignored. An
/// optional `language` field processes in that language, and the session
/// only switches to it when processing succeeds.
pub async fn process_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>> {
    let handle = state.session(id)?;
    let mut uploads = Vec::new();
    let mut language = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() == Some("language") {
            let tag = field
                .text()
                .await
                .map_err(|e| Error::InvalidInput(format!("Failed to read language: {}", e)))?;
            let (resolved, _) = state.service().languages().resolve(&tag)?;
            language = Some(resolved);
            continue;
        }

        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            tracing::warn!("Ignoring non-file form field {:?}", field.name());
            continue;
        };

        let data = field.bytes().await.map_err(|e| {
            Error::InvalidInput(format!("Failed to read file '{}': {}", filename, e))
        })?;

        tracing::info!("Received file: {} ({} bytes)", filename, data.len());
        uploads.push(UploadedFile::new(filename, data));
    }

    let mut session = handle.lock().await;
    let report = match language {
        Some(language) => {
            session
                .process_documents_in(state.service(), &uploads, language)
                .await?
        }
        None => session.process_documents(state.service(), &uploads).await?,
    };
    Ok(Json(report))
}
