use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::api::AppState;
use crate::auth::middleware::AuthUser;
use crate::domain::{KanbanError, PositionChange};
use crate::services::{Access, BoardService};

/// Change notifications for one board. Clients treat them as refetch hints;
/// nothing guarantees delivery or ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    BoardUpdated { board_id: String },
    BoardDeleted { board_id: String },
    ColumnCreated { board_id: String, column_id: String },
    ColumnUpdated { board_id: String, column_id: String },
    ColumnDeleted { board_id: String, column_id: String },
    ColumnsReordered { board_id: String, changes: Vec<PositionChange> },
    CardCreated { board_id: String, column_id: String, card_id: String },
    CardUpdated { board_id: String, card_id: String },
    CardMoved { board_id: String, card_id: String, from_column_id: String, to_column_id: String },
    CardDeleted { board_id: String, column_id: String, card_id: String },
}

impl BoardEvent {
    pub fn board_id(&self) -> &str {
        match self {
            BoardEvent::BoardUpdated { board_id }
            | BoardEvent::BoardDeleted { board_id }
            | BoardEvent::ColumnCreated { board_id, .. }
            | BoardEvent::ColumnUpdated { board_id, .. }
            | BoardEvent::ColumnDeleted { board_id, .. }
            | BoardEvent::ColumnsReordered { board_id, .. }
            | BoardEvent::CardCreated { board_id, .. }
            | BoardEvent::CardUpdated { board_id, .. }
            | BoardEvent::CardMoved { board_id, .. }
            | BoardEvent::CardDeleted { board_id, .. } => board_id,
        }
    }
}

pub async fn ws_board_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(board_id): Path<String>,
) -> Result<impl IntoResponse, KanbanError> {
    let pool = state.require_db()?;
    BoardService::require_access(pool, &board_id, &auth_user.user_id, Access::Read).await?;

    Ok(ws.on_upgrade(move |socket| forward_board_events(socket, board_id, state)))
}

async fn forward_board_events(socket: WebSocket, board_id: String, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.events_tx.subscribe());

    if sender
        .send(Message::Text(r#"{"type":"connected"}"#.into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            next = events.next() => match next {
                Some(Ok(payload)) => {
                    if !is_for_board(&payload, &board_id) {
                        continue;
                    }
                    if sender.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(n))) => {
                    tracing::debug!(skipped = n, board_id = %board_id, "Board event receiver lagged, continuing");
                }
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!(board_id = %board_id, "Board event socket closed");
}

fn is_for_board(payload: &str, board_id: &str) -> bool {
    serde_json::from_str::<BoardEvent>(payload)
        .map(|event| event.board_id() == board_id)
        .unwrap_or(false)
}
