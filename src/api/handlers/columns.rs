use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{CreateColumnRequest, MoveColumnRequest, UpdateColumnRequest};
use crate::api::handlers::events::BoardEvent;
use crate::api::state::AppState;
use crate::auth::middleware::AuthUser;
use crate::domain::{Column, KanbanError};
use crate::services::ColumnService;

pub async fn add_column(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(board_id): Path<String>,
    Json(req): Json<CreateColumnRequest>,
) -> Result<(StatusCode, Json<Column>), KanbanError> {
    let db = state.require_db()?;
    let column = ColumnService::add_column(db, &auth_user.user_id, &board_id, req).await?;

    state.publish(BoardEvent::ColumnCreated {
        board_id,
        column_id: column.id.clone(),
    });

    Ok((StatusCode::CREATED, Json(column)))
}

pub async fn update_column(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateColumnRequest>,
) -> Result<Json<Column>, KanbanError> {
    let db = state.require_db()?;
    let column = ColumnService::update_column(db, &auth_user.user_id, &id, req).await?;

    state.publish(BoardEvent::ColumnUpdated {
        board_id: column.board_id.clone(),
        column_id: column.id.clone(),
    });

    Ok(Json(column))
}

pub async fn remove_column(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    let db = state.require_db()?;
    let column = ColumnService::remove_column(db, &auth_user.user_id, &id).await?;

    state.publish(BoardEvent::ColumnDeleted {
        board_id: column.board_id,
        column_id: column.id,
    });

    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_column(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<MoveColumnRequest>,
) -> Result<Json<Vec<Column>>, KanbanError> {
    let db = state.require_db()?;
    let (columns, changes) =
        ColumnService::move_column(db, &auth_user.user_id, &id, req.index).await?;

    if let Some(board_id) = columns.first().map(|column| column.board_id.clone()) {
        if !changes.is_empty() {
            state.publish(BoardEvent::ColumnsReordered { board_id, changes });
        }
    }

    Ok(Json(columns))
}
