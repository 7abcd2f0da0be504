use chrono::Utc;
use sqlx::SqliteConnection;

use crate::domain::{KanbanError, PositionChange, Slot};

/// The two kinds of ordered lane that live in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneKind {
    /// Cards ordered within a column.
    Cards,
    /// Columns ordered within a board.
    Columns,
}

impl LaneKind {
    fn slots_query(self) -> &'static str {
        match self {
            LaneKind::Cards => {
                "SELECT id, position FROM cards WHERE column_id = ? ORDER BY position ASC, id ASC"
            }
            LaneKind::Columns => {
                "SELECT id, position FROM columns WHERE board_id = ? ORDER BY position ASC, id ASC"
            }
        }
    }

    fn update_query(self) -> &'static str {
        match self {
            LaneKind::Cards => "UPDATE cards SET position = ?, updated_at = ? WHERE id = ?",
            LaneKind::Columns => "UPDATE columns SET position = ?, updated_at = ? WHERE id = ?",
        }
    }
}

pub async fn load_slots(
    conn: &mut SqliteConnection,
    kind: LaneKind,
    lane_id: &str,
) -> Result<Vec<Slot>, KanbanError> {
    let slots: Vec<Slot> = sqlx::query_as(kind.slots_query())
        .bind(lane_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(slots)
}

/// Writes every change. Callers run this inside a transaction so a batch
/// lands all-or-nothing.
pub async fn write_changes(
    conn: &mut SqliteConnection,
    kind: LaneKind,
    changes: &[PositionChange],
) -> Result<(), KanbanError> {
    let now = Utc::now().to_rfc3339();

    for change in changes {
        match (&change.lane, kind) {
            (Some(column_id), LaneKind::Cards) => {
                sqlx::query(
                    "UPDATE cards SET column_id = ?, position = ?, updated_at = ? WHERE id = ?",
                )
                .bind(column_id)
                .bind(change.position)
                .bind(&now)
                .bind(&change.id)
                .execute(&mut *conn)
                .await?;
            }
            (Some(_), LaneKind::Columns) => {
                return Err(KanbanError::Internal(format!(
                    "Column {} cannot change boards",
                    change.id
                )));
            }
            (None, _) => {
                sqlx::query(kind.update_query())
                    .bind(change.position)
                    .bind(&now)
                    .bind(&change.id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
    }

    if !changes.is_empty() {
        tracing::debug!(lane = ?kind, count = changes.len(), "Positions rewritten");
    }

    Ok(())
}
