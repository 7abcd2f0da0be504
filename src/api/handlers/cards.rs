use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{
    CardResponse, CreateCardRequest, MoveCardRequest, MoveCardResponse, UpdateCardRequest,
};
use crate::api::handlers::events::BoardEvent;
use crate::api::AppState;
use crate::auth::middleware::AuthUser;
use crate::domain::KanbanError;
use crate::services::CardService;

pub async fn add_card(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(column_id): Path<String>,
    Json(req): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), KanbanError> {
    let pool = state.require_db()?;
    let (card, board_id) = CardService::add_card(pool, &auth_user.user_id, &column_id, req).await?;

    state.publish(BoardEvent::CardCreated {
        board_id,
        column_id,
        card_id: card.id.clone(),
    });

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_card(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<CardResponse>, KanbanError> {
    let pool = state.require_db()?;
    let card = CardService::get_card(pool, &auth_user.user_id, &id).await?;
    Ok(Json(card))
}

pub async fn update_card(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCardRequest>,
) -> Result<Json<CardResponse>, KanbanError> {
    let pool = state.require_db()?;
    let (card, board_id) = CardService::update_card(pool, &auth_user.user_id, &id, req).await?;

    state.publish(BoardEvent::CardUpdated {
        board_id,
        card_id: card.id.clone(),
    });

    Ok(Json(card))
}

pub async fn move_card(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<MoveCardRequest>,
) -> Result<Json<MoveCardResponse>, KanbanError> {
    let pool = state.require_db()?;
    let (moved, board_id) = CardService::move_card(pool, &auth_user.user_id, &id, req).await?;

    if moved.moved {
        state.publish(BoardEvent::CardMoved {
            board_id,
            card_id: moved.card.id.clone(),
            from_column_id: moved.from_column_id.clone(),
            to_column_id: moved.card.column_id.clone(),
        });
    }

    Ok(Json(moved))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    let pool = state.require_db()?;
    let (card, board_id) = CardService::delete_card(pool, &auth_user.user_id, &id).await?;

    state.publish(BoardEvent::CardDeleted {
        board_id,
        column_id: card.column_id,
        card_id: card.id,
    });

    Ok(StatusCode::NO_CONTENT)
}
