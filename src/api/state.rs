use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::api::handlers::events::BoardEvent;
use crate::config::Config;
use crate::domain::KanbanError;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Option<SqlitePool>,
    pub events_tx: broadcast::Sender<String>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: Option<SqlitePool>,
        events_tx: broadcast::Sender<String>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            db,
            events_tx,
            config,
        }
    }

    pub fn require_db(&self) -> Result<&SqlitePool, KanbanError> {
        self.db
            .as_ref()
            .ok_or_else(|| KanbanError::Internal("Database not available".into()))
    }

    /// Fire-and-forget: having no subscribers is not an error.
    pub fn publish(&self, event: BoardEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => {
                let _ = self.events_tx.send(payload);
            }
            Err(e) => tracing::warn!("Failed to serialize board event: {}", e),
        }
    }
}
