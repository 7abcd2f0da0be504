pub mod attachments;
pub mod boards;
pub mod cards;
pub mod columns;
pub mod events;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::api::state::AppState;
use crate::infrastructure::db;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = match &state.db {
        Some(pool) => match db::journal_mode(pool).await {
            Ok(mode) => json!({ "status": "ok", "journal_mode": mode }),
            Err(e) => {
                tracing::warn!("Health check query failed: {}", e);
                json!({ "status": "error" })
            }
        },
        None => json!({ "status": "unavailable" }),
    };
    let healthy = database["status"] == "ok";

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "degraded" },
            "database": database,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
