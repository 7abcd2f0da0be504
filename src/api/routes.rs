use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;
use crate::auth;
use crate::config::Config;

/// Room for multipart framing on top of the file payload itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState, config: &Config) -> Router {
    let origins: Vec<HeaderValue> = config
        .cors_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let board_routes = Router::new()
        .route(
            "/",
            get(handlers::boards::list_boards).post(handlers::boards::create_board),
        )
        .route(
            "/{id}",
            get(handlers::boards::get_board)
                .patch(handlers::boards::update_board)
                .delete(handlers::boards::delete_board),
        )
        .route("/{id}/columns", post(handlers::columns::add_column));

    let column_routes = Router::new()
        .route(
            "/{id}",
            patch(handlers::columns::update_column).delete(handlers::columns::remove_column),
        )
        .route("/{id}/move", patch(handlers::columns::move_column))
        .route("/{id}/cards", post(handlers::cards::add_card));

    let card_routes = Router::new()
        .route(
            "/{id}",
            get(handlers::cards::get_card)
                .patch(handlers::cards::update_card)
                .delete(handlers::cards::delete_card),
        )
        .route("/{id}/move", patch(handlers::cards::move_card))
        .route(
            "/{id}/attachments",
            get(handlers::attachments::list_attachments)
                .post(handlers::attachments::upload_attachments)
                .layer(DefaultBodyLimit::max(
                    config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
                )),
        );

    let attachment_routes = Router::new().route(
        "/{id}",
        get(handlers::attachments::download_attachment)
            .delete(handlers::attachments::delete_attachment),
    );

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::liveness))
        .route("/api/auth/register", post(auth::handlers::register))
        .route("/api/auth/login", post(auth::handlers::login))
        .route("/api/auth/refresh", post(auth::handlers::refresh))
        .route("/api/auth/logout", post(auth::handlers::logout));

    let protected_routes = Router::new()
        .route(
            "/api/auth/me",
            get(auth::handlers::me).patch(auth::handlers::update_profile),
        )
        .route("/api/auth/password", post(auth::handlers::change_password))
        .route("/ws/boards/{id}", get(handlers::events::ws_board_events))
        .nest("/api/boards", board_routes)
        .nest("/api/columns", column_routes)
        .nest("/api/cards", card_routes)
        .nest("/api/attachments", attachment_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
