use serde::{Deserialize, Serialize};

use crate::api::dto::ColumnWithCards;
use crate::domain::{Attachment, Card};

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub avatars: Option<Vec<String>>,
    #[serde(default)]
    pub due_date: Option<String>,
    /// Insert position within the column; appended when absent.
    #[serde(default)]
    pub index: Option<usize>,
}

/// Absent fields are kept. For `description` and `due_date` an empty string
/// clears the value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub avatars: Option<Vec<String>>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Drop target of a drag. Without `index` the card goes to the end of
/// `column_id`.
#[derive(Debug, Deserialize)]
pub struct MoveCardRequest {
    pub column_id: String,
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub id: String,
    pub column_id: String,
    pub title: String,
    pub description: Option<String>,
    pub progress: Option<i64>,
    pub tags: Vec<String>,
    pub avatars: Vec<String>,
    pub due_date: Option<String>,
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl CardResponse {
    pub fn from_card(card: Card) -> Self {
        let tags = serde_json::from_str(&card.tags).unwrap_or_default();
        let avatars = serde_json::from_str(&card.avatars).unwrap_or_default();
        Self {
            id: card.id,
            column_id: card.column_id,
            title: card.title,
            description: card.description,
            progress: card.progress,
            tags,
            avatars,
            due_date: card.due_date,
            position: card.position,
            created_at: card.created_at,
            updated_at: card.updated_at,
            attachments: None,
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = Some(attachments);
        self
    }
}

/// Result of a drag: the moved card plus every column whose order changed,
/// so a client can replace its optimistic state instead of refetching.
#[derive(Debug, Serialize)]
pub struct MoveCardResponse {
    pub card: CardResponse,
    pub from_column_id: String,
    /// False when the drop left every position as it was.
    pub moved: bool,
    pub columns: Vec<ColumnWithCards>,
}
