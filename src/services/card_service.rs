use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::dto::{
    CardResponse, CreateCardRequest, MoveCardRequest, MoveCardResponse, UpdateCardRequest,
};
use crate::domain::fields;
use crate::domain::ordering;
use crate::domain::{Board, Card, Column, KanbanError, PositionChange, Slot};
use crate::services::board_service::Access;
use crate::services::positions::{self, LaneKind};
use crate::services::{AttachmentService, ColumnService};

pub struct CardService;

impl CardService {
    pub async fn get_card_model(pool: &SqlitePool, id: &str) -> Result<Card, KanbanError> {
        let card: Card = sqlx::query_as("SELECT * FROM cards WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("Card not found: {}", id)))?;

        Ok(card)
    }

    /// Loads a card together with its column and board, checking access on the
    /// board.
    pub async fn require_access(
        pool: &SqlitePool,
        card_id: &str,
        user_id: &str,
        access: Access,
    ) -> Result<(Card, Column, Board), KanbanError> {
        let card = Self::get_card_model(pool, card_id).await?;
        let (column, board) = ColumnService::require_access(pool, &card.column_id, user_id, access)
            .await
            .map_err(|err| match err {
                KanbanError::NotFound(_) => {
                    KanbanError::NotFound(format!("Card not found: {}", card_id))
                }
                other => other,
            })?;

        Ok((card, column, board))
    }

    // ── Card CRUD ──────────────────────────────────────────────

    pub async fn add_card(
        pool: &SqlitePool,
        user_id: &str,
        column_id: &str,
        req: CreateCardRequest,
    ) -> Result<(CardResponse, String), KanbanError> {
        let (_, board) = ColumnService::require_access(pool, column_id, user_id, Access::Write).await?;

        let title = fields::parse_title(&req.title).map_err(KanbanError::BadRequest)?;
        let description = fields::patch_optional(None, req.description);
        let progress = fields::validate_progress(req.progress.unwrap_or(0))
            .map_err(KanbanError::BadRequest)?;
        let tags = serde_json::to_string(&clean_list(req.tags.unwrap_or_default()))?;
        let avatars = serde_json::to_string(&clean_list(req.avatars.unwrap_or_default()))?;
        let due_date = match req.due_date {
            Some(raw) if !raw.trim().is_empty() => {
                Some(fields::parse_due_date(&raw).map_err(KanbanError::BadRequest)?)
            }
            _ => None,
        };
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = pool.begin().await?;

        let mut slots = positions::load_slots(&mut tx, LaneKind::Cards, column_id).await?;
        let new_slot = Slot {
            id: id.clone(),
            position: -1,
        };
        let shifted: Vec<PositionChange> = ordering::insert_at(&mut slots, new_slot, req.index)
            .into_iter()
            .filter(|change| change.id != id)
            .collect();
        positions::write_changes(&mut tx, LaneKind::Cards, &shifted).await?;
        let position = slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.position)
            .unwrap_or_else(|| ordering::next_position(&slots));

        let card: Card = sqlx::query_as(
            "INSERT INTO cards (id, column_id, title, description, progress, tags, avatars, due_date, position, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&id)
        .bind(column_id)
        .bind(&title)
        .bind(&description)
        .bind(progress)
        .bind(&tags)
        .bind(&avatars)
        .bind(&due_date)
        .bind(position)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((CardResponse::from_card(card), board.id))
    }

    pub async fn get_card(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> Result<CardResponse, KanbanError> {
        let (card, _, _) = Self::require_access(pool, id, user_id, Access::Read).await?;
        let attachments = AttachmentService::list_for_card(pool, id).await?;

        Ok(CardResponse::from_card(card).with_attachments(attachments))
    }

    pub async fn update_card(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        req: UpdateCardRequest,
    ) -> Result<(CardResponse, String), KanbanError> {
        let (existing, _, board) = Self::require_access(pool, id, user_id, Access::Write).await?;

        let title = match req.title {
            Some(title) => fields::parse_title(&title).map_err(KanbanError::BadRequest)?,
            None => existing.title,
        };
        let description = fields::patch_optional(existing.description, req.description);
        let progress = match req.progress {
            Some(progress) => {
                Some(fields::validate_progress(progress).map_err(KanbanError::BadRequest)?)
            }
            None => existing.progress,
        };
        let tags = match req.tags {
            Some(tags) => serde_json::to_string(&clean_list(tags))?,
            None => existing.tags,
        };
        let avatars = match req.avatars {
            Some(avatars) => serde_json::to_string(&clean_list(avatars))?,
            None => existing.avatars,
        };
        let due_date = match fields::patch_optional(existing.due_date, req.due_date) {
            Some(raw) => Some(fields::parse_due_date(&raw).map_err(KanbanError::BadRequest)?),
            None => None,
        };
        let now = Utc::now().to_rfc3339();

        let card: Card = sqlx::query_as(
            "UPDATE cards SET title = ?, description = ?, progress = ?, tags = ?, avatars = ?, due_date = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(&title)
        .bind(&description)
        .bind(progress)
        .bind(&tags)
        .bind(&avatars)
        .bind(&due_date)
        .bind(&now)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok((CardResponse::from_card(card), board.id))
    }

    /// Moves a card within its column or onto another column of the same
    /// board. All position writes for both columns commit together.
    pub async fn move_card(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        req: MoveCardRequest,
    ) -> Result<(MoveCardResponse, String), KanbanError> {
        let (card, source, board) = Self::require_access(pool, id, user_id, Access::Write).await?;
        let target = if req.column_id == source.id {
            source.clone()
        } else {
            let (target, _) =
                ColumnService::require_access(pool, &req.column_id, user_id, Access::Write).await?;
            if target.board_id != source.board_id {
                return Err(KanbanError::BadRequest(format!(
                    "Column {} belongs to a different board",
                    target.id
                )));
            }
            target
        };

        // Dropping a card back onto its own column without a slot leaves it
        // where it is.
        if target.id == source.id && req.index.is_none() {
            return Ok((
                MoveCardResponse {
                    card: CardResponse::from_card(card),
                    from_column_id: source.id.clone(),
                    moved: false,
                    columns: vec![ColumnService::column_with_cards(pool, &source.id).await?],
                },
                board.id,
            ));
        }

        let mut tx = pool.begin().await?;

        let mut source_slots = positions::load_slots(&mut tx, LaneKind::Cards, &source.id).await?;
        let changes = match req.index {
            Some(to_index) if target.id == source.id => {
                ordering::reorder(&mut source_slots, id, to_index)?
            }
            _ => {
                let mut target_slots =
                    positions::load_slots(&mut tx, LaneKind::Cards, &target.id).await?;
                ordering::transfer(
                    &mut source_slots,
                    &mut target_slots,
                    id,
                    req.index,
                    &target.id,
                )?
            }
        };
        positions::write_changes(&mut tx, LaneKind::Cards, &changes).await?;

        tx.commit().await?;

        tracing::info!(
            card_id = id,
            from_column = %source.id,
            to_column = %target.id,
            from_position = card.position,
            rewritten = changes.len(),
            "Card moved"
        );

        let moved = Self::get_card_model(pool, id).await?;
        let mut columns = vec![ColumnService::column_with_cards(pool, &source.id).await?];
        if target.id != source.id {
            columns.push(ColumnService::column_with_cards(pool, &target.id).await?);
        }

        Ok((
            MoveCardResponse {
                card: CardResponse::from_card(moved),
                from_column_id: source.id,
                moved: !changes.is_empty(),
                columns,
            },
            board.id,
        ))
    }

    /// Deletes a card and closes the gap it leaves in its column. Returns the
    /// deleted card and its board id.
    pub async fn delete_card(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> Result<(Card, String), KanbanError> {
        let (card, column, board) = Self::require_access(pool, id, user_id, Access::Write).await?;
        let stored_files = AttachmentService::stored_paths_for_card(pool, id).await?;

        let mut tx = pool.begin().await?;

        let mut slots = positions::load_slots(&mut tx, LaneKind::Cards, &column.id).await?;
        let (_, changes) = ordering::remove(&mut slots, id)?;

        sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        positions::write_changes(&mut tx, LaneKind::Cards, &changes).await?;

        tx.commit().await?;

        AttachmentService::remove_stored_files(stored_files).await;
        tracing::info!(card_id = id, column_id = %column.id, "Card deleted");

        Ok((card, board.id))
    }
}

/// Trims entries and drops blanks.
fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_list_trims_and_drops_blanks() {
        let cleaned = clean_list(vec![" Important ".into(), "".into(), "  ".into(), "Meh".into()]);
        assert_eq!(cleaned, vec!["Important", "Meh"]);
    }
}
