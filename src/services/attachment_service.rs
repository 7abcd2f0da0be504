use std::path::{Path, PathBuf};

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::domain::{Attachment, KanbanError};

#[derive(Debug, sqlx::FromRow)]
pub struct StoredFile {
    pub card_id: String,
    pub file_path: String,
    pub original_filename: String,
    pub mime_type: String,
}

pub struct AttachmentService;

impl AttachmentService {
    pub async fn list_for_card(
        pool: &SqlitePool,
        card_id: &str,
    ) -> Result<Vec<Attachment>, KanbanError> {
        let attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, card_id, filename, original_filename, file_size, mime_type, uploaded_at
            FROM attachments
            WHERE card_id = ?
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(card_id)
        .fetch_all(pool)
        .await?;

        Ok(attachments)
    }

    /// Writes `data` under `<uploads_dir>/<card_id>/` and records it.
    pub async fn store(
        pool: &SqlitePool,
        uploads_dir: &Path,
        card_id: &str,
        filename: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<Attachment, KanbanError> {
        let upload_dir = uploads_dir.join(card_id);
        fs::create_dir_all(&upload_dir).await.map_err(|e| {
            KanbanError::Internal(format!("Failed to create upload directory: {}", e))
        })?;

        let id = Uuid::new_v4().to_string();
        let stored_filename = format!("{}_{}", id, sanitize_filename(filename));
        let file_path: PathBuf = upload_dir.join(&stored_filename);

        let mut file = fs::File::create(&file_path)
            .await
            .map_err(|e| KanbanError::Internal(format!("Failed to create file: {}", e)))?;
        file.write_all(data)
            .await
            .map_err(|e| KanbanError::Internal(format!("Failed to write file: {}", e)))?;

        let now = Utc::now().to_rfc3339();

        let inserted = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (id, card_id, filename, original_filename, file_path, file_size, mime_type, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, card_id, filename, original_filename, file_size, mime_type, uploaded_at
            "#,
        )
        .bind(&id)
        .bind(card_id)
        .bind(&stored_filename)
        .bind(filename)
        .bind(file_path.to_string_lossy().to_string())
        .bind(data.len() as i64)
        .bind(mime_type)
        .bind(&now)
        .fetch_one(pool)
        .await;

        match inserted {
            Ok(attachment) => Ok(attachment),
            Err(err) => {
                Self::remove_stored_files(vec![file_path.to_string_lossy().to_string()]).await;
                Err(err.into())
            }
        }
    }

    pub async fn get_stored(pool: &SqlitePool, id: &str) -> Result<StoredFile, KanbanError> {
        let stored: StoredFile = sqlx::query_as(
            "SELECT card_id, file_path, original_filename, mime_type FROM attachments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| KanbanError::NotFound(format!("Attachment not found: {}", id)))?;

        Ok(stored)
    }

    pub async fn read(stored: &StoredFile) -> Result<Vec<u8>, KanbanError> {
        fs::read(&stored.file_path)
            .await
            .map_err(|e| KanbanError::Internal(format!("Failed to read file: {}", e)))
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<(), KanbanError> {
        let stored = Self::get_stored(pool, id).await?;

        sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Self::remove_stored_files(vec![stored.file_path]).await;
        Ok(())
    }

    pub async fn stored_paths_for_card(
        pool: &SqlitePool,
        card_id: &str,
    ) -> Result<Vec<String>, KanbanError> {
        let paths = sqlx::query_scalar("SELECT file_path FROM attachments WHERE card_id = ?")
            .bind(card_id)
            .fetch_all(pool)
            .await?;

        Ok(paths)
    }

    pub async fn stored_paths_for_column(
        pool: &SqlitePool,
        column_id: &str,
    ) -> Result<Vec<String>, KanbanError> {
        let paths = sqlx::query_scalar(
            "SELECT a.file_path FROM attachments a JOIN cards c ON c.id = a.card_id WHERE c.column_id = ?",
        )
        .bind(column_id)
        .fetch_all(pool)
        .await?;

        Ok(paths)
    }

    pub async fn stored_paths_for_board(
        pool: &SqlitePool,
        board_id: &str,
    ) -> Result<Vec<String>, KanbanError> {
        let paths = sqlx::query_scalar(
            "SELECT a.file_path FROM attachments a JOIN cards c ON c.id = a.card_id JOIN columns col ON col.id = c.column_id WHERE col.board_id = ?",
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        Ok(paths)
    }

    /// Best effort: rows are already gone, so a missing file only warrants a
    /// warning.
    pub async fn remove_stored_files(paths: Vec<String>) {
        for path in paths {
            if let Err(e) = fs::remove_file(&path).await {
                tracing::warn!("Failed to delete file {}: {}", path, e);
            }
        }
    }
}

pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Leading dots would make hidden files or `..` path segments.
    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".into()
    } else {
        trimmed.to_string()
    }
}
