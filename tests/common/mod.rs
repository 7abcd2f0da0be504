use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use kanban_board::api::{create_router, AppState};
use kanban_board::config::Config;
use kanban_board::infrastructure::db;

pub struct TestApp {
    pub router: Router,
    pub pool: sqlx::SqlitePool,
    pub events_tx: tokio::sync::broadcast::Sender<String>,
    // Held so the uploads directory outlives the test.
    pub uploads: TempDir,
}

pub fn test_config(uploads: &TempDir) -> Config {
    Config {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        cookie_secure: false,
        uploads_dir: uploads.path().to_string_lossy().to_string(),
        max_upload_bytes: 1024,
        seed_demo_board: false,
    }
}

pub async fn setup_app() -> TestApp {
    setup_app_with(|_| {}).await
}

pub async fn setup_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let uploads = TempDir::new().expect("uploads dir should be created");
    let mut config = test_config(&uploads);
    customize(&mut config);

    let pool = db::init_db(&config.database_url)
        .await
        .expect("Failed to create test database");
    let (events_tx, _) = tokio::sync::broadcast::channel(100);
    let config = Arc::new(config);
    let state = AppState::new(Some(pool.clone()), events_tx.clone(), Arc::clone(&config));
    let router = create_router(state, &config);

    TestApp {
        router,
        pool,
        events_tx,
        uploads,
    }
}

/// Registers a user and returns its access token and id.
pub async fn register(app: &Router, email: &str) -> (String, String) {
    let body = json!({
        "email": email,
        "password": "correct-horse-battery",
        "full_name": "Test User"
    })
    .to_string();

    let (status, body) = make_request(app.clone(), "POST", "/api/auth/register", Some(body), None).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let json: Value = serde_json::from_str(&body).unwrap();
    (
        json["access_token"].as_str().unwrap().to_string(),
        json["user"]["id"].as_str().unwrap().to_string(),
    )
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
    token: Option<&str>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }

    let request = request
        .body(Body::from(body.unwrap_or_default()))
        .unwrap();

    send(app, request).await
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8_lossy(&body).to_string();

    (status, body_str)
}

pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: &str,
) -> (StatusCode, Value) {
    let (status, body) = make_request(
        app.clone(),
        method,
        uri,
        body.map(|b| b.to_string()),
        Some(token),
    )
    .await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };
    (status, json)
}
