use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::dto::{ColumnWithCards, CreateColumnRequest, UpdateColumnRequest};
use crate::domain::fields;
use crate::domain::ordering::{self, sort_by_position};
use crate::domain::{Board, Card, Column, KanbanError, PositionChange};
use crate::services::board_service::{parse_optional_color, Access, BoardService};
use crate::services::positions::{self, LaneKind};
use crate::services::AttachmentService;

pub struct ColumnService;

impl ColumnService {
    pub async fn get_column_model(pool: &SqlitePool, id: &str) -> Result<Column, KanbanError> {
        let column: Column = sqlx::query_as("SELECT * FROM columns WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("Column not found: {}", id)))?;

        Ok(column)
    }

    /// Loads a column and its board, checking access on the board.
    pub async fn require_access(
        pool: &SqlitePool,
        column_id: &str,
        user_id: &str,
        access: Access,
    ) -> Result<(Column, Board), KanbanError> {
        let column = Self::get_column_model(pool, column_id).await?;
        let board = BoardService::require_access(pool, &column.board_id, user_id, access)
            .await
            .map_err(|err| match err {
                // Do not reveal that the column exists on someone else's private board.
                KanbanError::NotFound(_) => {
                    KanbanError::NotFound(format!("Column not found: {}", column_id))
                }
                other => other,
            })?;

        Ok((column, board))
    }

    pub async fn column_with_cards(
        pool: &SqlitePool,
        column_id: &str,
    ) -> Result<ColumnWithCards, KanbanError> {
        let column = Self::get_column_model(pool, column_id).await?;

        let mut cards: Vec<Card> = sqlx::query_as("SELECT * FROM cards WHERE column_id = ?")
            .bind(column_id)
            .fetch_all(pool)
            .await?;
        sort_by_position(&mut cards);

        Ok(ColumnWithCards::new(column, cards))
    }

    pub async fn add_column(
        pool: &SqlitePool,
        user_id: &str,
        board_id: &str,
        req: CreateColumnRequest,
    ) -> Result<Column, KanbanError> {
        BoardService::require_access(pool, board_id, user_id, Access::Write).await?;

        let title = fields::parse_title(&req.title).map_err(KanbanError::BadRequest)?;
        let color = parse_optional_color(req.color)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = pool.begin().await?;

        // Heal any gaps first so the new column lands at exactly `len`.
        let mut slots = positions::load_slots(&mut tx, LaneKind::Columns, board_id).await?;
        let healed = ordering::resequence(&mut slots);
        positions::write_changes(&mut tx, LaneKind::Columns, &healed).await?;
        let position = ordering::next_position(&slots);

        let column: Column = sqlx::query_as(
            "INSERT INTO columns (id, board_id, title, color, position, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&id)
        .bind(board_id)
        .bind(&title)
        .bind(&color)
        .bind(position)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(column)
    }

    pub async fn update_column(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        req: UpdateColumnRequest,
    ) -> Result<Column, KanbanError> {
        let (existing, _) = Self::require_access(pool, id, user_id, Access::Write).await?;

        let title = match req.title {
            Some(title) => fields::parse_title(&title).map_err(KanbanError::BadRequest)?,
            None => existing.title,
        };
        let color = match req.color {
            Some(color) => parse_optional_color(Some(color))?,
            None => existing.color,
        };
        let now = Utc::now().to_rfc3339();

        let column: Column = sqlx::query_as(
            "UPDATE columns SET title = ?, color = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(&title)
        .bind(&color)
        .bind(&now)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(column)
    }

    /// Deletes the column with its cards and closes the gap among the
    /// remaining columns. Returns the deleted column.
    pub async fn remove_column(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> Result<Column, KanbanError> {
        let (column, _) = Self::require_access(pool, id, user_id, Access::Write).await?;
        let stored_files = AttachmentService::stored_paths_for_column(pool, id).await?;

        let mut tx = pool.begin().await?;

        let mut slots = positions::load_slots(&mut tx, LaneKind::Columns, &column.board_id).await?;
        let (_, changes) = ordering::remove(&mut slots, id)?;

        sqlx::query("DELETE FROM columns WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        positions::write_changes(&mut tx, LaneKind::Columns, &changes).await?;

        tx.commit().await?;

        AttachmentService::remove_stored_files(stored_files).await;
        tracing::info!(column_id = id, board_id = %column.board_id, "Column removed");

        Ok(column)
    }

    /// Reorders a column within its board. Returns every column of the board
    /// in the new order.
    pub async fn move_column(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        to_index: usize,
    ) -> Result<(Vec<Column>, Vec<PositionChange>), KanbanError> {
        let (column, _) = Self::require_access(pool, id, user_id, Access::Write).await?;

        let mut tx = pool.begin().await?;

        let mut slots = positions::load_slots(&mut tx, LaneKind::Columns, &column.board_id).await?;
        let changes = ordering::reorder(&mut slots, id, to_index)?;
        positions::write_changes(&mut tx, LaneKind::Columns, &changes).await?;

        let mut columns: Vec<Column> = sqlx::query_as("SELECT * FROM columns WHERE board_id = ?")
            .bind(&column.board_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        sort_by_position(&mut columns);
        Ok((columns, changes))
    }
}
