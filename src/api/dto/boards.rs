use serde::{Deserialize, Serialize};

use crate::api::dto::CardResponse;
use crate::domain::{Board, Card, Column};

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBoardRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateColumnRequest {
    pub title: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateColumnRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveColumnRequest {
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct ColumnWithCards {
    pub id: String,
    pub board_id: String,
    pub title: String,
    pub color: Option<String>,
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
    pub cards: Vec<CardResponse>,
}

impl ColumnWithCards {
    pub fn new(column: Column, cards: Vec<Card>) -> Self {
        Self {
            id: column.id,
            board_id: column.board_id,
            title: column.title,
            color: column.color,
            position: column.position,
            created_at: column.created_at,
            updated_at: column.updated_at,
            cards: cards.into_iter().map(CardResponse::from_card).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<ColumnWithCards>,
}
