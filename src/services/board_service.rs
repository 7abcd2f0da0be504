use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::dto::{BoardDetail, ColumnWithCards, CreateBoardRequest, UpdateBoardRequest};
use crate::domain::fields::{self, HexColor};
use crate::domain::ordering::sort_by_position;
use crate::domain::{Board, Card, Column, KanbanError};
use crate::services::AttachmentService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

pub struct BoardService;

impl BoardService {
    /// Loads a board and checks `user_id` may access it. Private boards of
    /// other users look missing; public ones reject writes.
    pub async fn require_access(
        pool: &SqlitePool,
        board_id: &str,
        user_id: &str,
        access: Access,
    ) -> Result<Board, KanbanError> {
        let board: Board = sqlx::query_as("SELECT * FROM boards WHERE id = ?")
            .bind(board_id)
            .fetch_optional(pool)
            .await?
            .filter(|board: &Board| board.is_visible_to(user_id))
            .ok_or_else(|| KanbanError::NotFound(format!("Board not found: {}", board_id)))?;

        if access == Access::Write && !board.is_owned_by(user_id) {
            return Err(KanbanError::Forbidden(format!(
                "Only the owner can modify board {}",
                board_id
            )));
        }

        Ok(board)
    }

    pub async fn list_boards(pool: &SqlitePool, user_id: &str) -> Result<Vec<Board>, KanbanError> {
        let boards: Vec<Board> = sqlx::query_as(
            "SELECT * FROM boards WHERE owner_id = ? OR is_public = 1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(boards)
    }

    pub async fn create_board(
        pool: &SqlitePool,
        user_id: &str,
        req: CreateBoardRequest,
    ) -> Result<Board, KanbanError> {
        let title = fields::parse_title(&req.title).map_err(KanbanError::BadRequest)?;
        let background_color = parse_optional_color(req.background_color)?;
        let description = fields::patch_optional(None, req.description);
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let board: Board = sqlx::query_as(
            "INSERT INTO boards (id, title, description, owner_id, background_color, is_public, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&id)
        .bind(&title)
        .bind(&description)
        .bind(user_id)
        .bind(&background_color)
        .bind(req.is_public.unwrap_or(false))
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await?;

        tracing::info!(board_id = %board.id, owner_id = user_id, "Board created");
        Ok(board)
    }

    /// The board with its columns and their cards, all in display order.
    pub async fn get_board_detail(
        pool: &SqlitePool,
        user_id: &str,
        board_id: &str,
    ) -> Result<BoardDetail, KanbanError> {
        let board = Self::require_access(pool, board_id, user_id, Access::Read).await?;

        let mut columns: Vec<Column> = sqlx::query_as("SELECT * FROM columns WHERE board_id = ?")
            .bind(board_id)
            .fetch_all(pool)
            .await?;
        sort_by_position(&mut columns);

        let cards: Vec<Card> = sqlx::query_as(
            "SELECT cards.* FROM cards JOIN columns ON columns.id = cards.column_id WHERE columns.board_id = ?",
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        let mut by_column: HashMap<String, Vec<Card>> = HashMap::new();
        for card in cards {
            by_column.entry(card.column_id.clone()).or_default().push(card);
        }

        let columns = columns
            .into_iter()
            .map(|column| {
                let mut cards = by_column.remove(&column.id).unwrap_or_default();
                sort_by_position(&mut cards);
                ColumnWithCards::new(column, cards)
            })
            .collect();

        Ok(BoardDetail { board, columns })
    }

    pub async fn update_board(
        pool: &SqlitePool,
        user_id: &str,
        board_id: &str,
        req: UpdateBoardRequest,
    ) -> Result<Board, KanbanError> {
        let existing = Self::require_access(pool, board_id, user_id, Access::Write).await?;

        let title = match req.title {
            Some(title) => fields::parse_title(&title).map_err(KanbanError::BadRequest)?,
            None => existing.title,
        };
        let description = fields::patch_optional(existing.description, req.description);
        let background_color = match req.background_color {
            Some(color) => parse_optional_color(Some(color))?,
            None => existing.background_color,
        };
        let is_public = req.is_public.unwrap_or(existing.is_public);
        let now = Utc::now().to_rfc3339();

        let board: Board = sqlx::query_as(
            "UPDATE boards SET title = ?, description = ?, background_color = ?, is_public = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(&title)
        .bind(&description)
        .bind(&background_color)
        .bind(is_public)
        .bind(&now)
        .bind(board_id)
        .fetch_one(pool)
        .await?;

        Ok(board)
    }

    pub async fn delete_board(
        pool: &SqlitePool,
        user_id: &str,
        board_id: &str,
    ) -> Result<(), KanbanError> {
        Self::require_access(pool, board_id, user_id, Access::Write).await?;
        let stored_files = AttachmentService::stored_paths_for_board(pool, board_id).await?;

        sqlx::query("DELETE FROM boards WHERE id = ?")
            .bind(board_id)
            .execute(pool)
            .await?;

        AttachmentService::remove_stored_files(stored_files).await;
        tracing::info!(board_id, "Board deleted");
        Ok(())
    }
}

/// `None` or blank clears; anything else must be `#RRGGBB`.
pub(crate) fn parse_optional_color(raw: Option<String>) -> Result<Option<String>, KanbanError> {
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .parse::<HexColor>()
            .map(|color| Some(color.into_string()))
            .map_err(KanbanError::BadRequest),
        _ => Ok(None),
    }
}
