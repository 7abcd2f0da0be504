use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{BoardDetail, CreateBoardRequest, UpdateBoardRequest};
use crate::api::handlers::events::BoardEvent;
use crate::api::state::AppState;
use crate::auth::middleware::AuthUser;
use crate::domain::{Board, KanbanError};
use crate::services::BoardService;

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<Board>>, KanbanError> {
    let db = state.require_db()?;
    let boards = BoardService::list_boards(db, &auth_user.user_id).await?;
    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<Board>), KanbanError> {
    let db = state.require_db()?;
    let board = BoardService::create_board(db, &auth_user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<BoardDetail>, KanbanError> {
    let db = state.require_db()?;
    let board = BoardService::get_board_detail(db, &auth_user.user_id, &id).await?;
    Ok(Json(board))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBoardRequest>,
) -> Result<Json<Board>, KanbanError> {
    let db = state.require_db()?;
    let board = BoardService::update_board(db, &auth_user.user_id, &id, req).await?;

    state.publish(BoardEvent::BoardUpdated {
        board_id: board.id.clone(),
    });

    Ok(Json(board))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    let db = state.require_db()?;
    BoardService::delete_board(db, &auth_user.user_id, &id).await?;

    state.publish(BoardEvent::BoardDeleted { board_id: id });

    Ok(StatusCode::NO_CONTENT)
}
