use std::path::Path as FsPath;

use axum::{
    extract::{Extension, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::api::handlers::events::BoardEvent;
use crate::api::state::AppState;
use crate::auth::middleware::AuthUser;
use crate::domain::{Attachment, KanbanError};
use crate::services::{Access, AttachmentService, CardService};

pub async fn upload_attachments(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(card_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Attachment>>), KanbanError> {
    let db = state.require_db()?;
    let (_, _, board) =
        CardService::require_access(db, &card_id, &auth_user.user_id, Access::Write).await?;

    let uploads_dir = FsPath::new(&state.config.uploads_dir);
    let max_bytes = state.config.max_upload_bytes;
    let mut uploaded = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        KanbanError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let filename = field
            .file_name()
            .map(|s: &str| s.to_string())
            .unwrap_or_else(|| format!("file_{}", Uuid::new_v4()));

        let content_type = field
            .content_type()
            .map(|s: &str| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| KanbanError::BadRequest(format!("Failed to read file data: {}", e)))?;

        if data.len() > max_bytes {
            return Err(KanbanError::BadRequest(format!(
                "File too large: {} bytes (max {} bytes)",
                data.len(),
                max_bytes
            )));
        }

        let attachment =
            AttachmentService::store(db, uploads_dir, &card_id, &filename, &content_type, &data)
                .await?;
        uploaded.push(attachment);
    }

    if uploaded.is_empty() {
        return Err(KanbanError::BadRequest("No file provided".into()));
    }

    state.publish(BoardEvent::CardUpdated {
        board_id: board.id,
        card_id,
    });

    Ok((StatusCode::CREATED, Json(uploaded)))
}

pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(card_id): Path<String>,
) -> Result<Json<Vec<Attachment>>, KanbanError> {
    let db = state.require_db()?;
    CardService::require_access(db, &card_id, &auth_user.user_id, Access::Read).await?;

    let attachments = AttachmentService::list_for_card(db, &card_id).await?;
    Ok(Json(attachments))
}

pub async fn download_attachment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, KanbanError> {
    let db = state.require_db()?;
    let stored = AttachmentService::get_stored(db, &id).await?;
    CardService::require_access(db, &stored.card_id, &auth_user.user_id, Access::Read)
        .await
        .map_err(|err| match err {
            KanbanError::NotFound(_) => KanbanError::NotFound(format!("Attachment not found: {}", id)),
            other => other,
        })?;

    let data = AttachmentService::read(&stored).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, stored.mime_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", stored.original_filename.replace('"', "")),
            ),
        ],
        data,
    ))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    let db = state.require_db()?;
    let stored = AttachmentService::get_stored(db, &id).await?;
    let (_, _, board) =
        CardService::require_access(db, &stored.card_id, &auth_user.user_id, Access::Write)
            .await
            .map_err(|err| match err {
                KanbanError::NotFound(_) => {
                    KanbanError::NotFound(format!("Attachment not found: {}", id))
                }
                other => other,
            })?;

    AttachmentService::delete(db, &id).await?;

    state.publish(BoardEvent::CardUpdated {
        board_id: board.id,
        card_id: stored.card_id,
    });

    Ok(StatusCode::NO_CONTENT)
}
