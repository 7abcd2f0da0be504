use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::state::AppState;
use crate::auth::{cookies, jwt};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let db = state.require_db().map_err(|_| StatusCode::UNAUTHORIZED)?;
    let signing_key = jwt::get_or_create_signing_key(db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let claims = jwt::verify_token(&signing_key, &token).map_err(|e| {
        tracing::debug!("Rejected access token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
    });

    Ok(next.run(req).await)
}

/// Bearer header first, then the access cookie, then `?token=` (browsers
/// cannot set headers on a WebSocket upgrade).
pub fn extract_token(req: &Request) -> Option<String> {
    let bearer = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer
        .or_else(|| cookies::cookie_value(req.headers(), cookies::ACCESS_TOKEN_COOKIE))
        .or_else(|| req.uri().query().and_then(token_from_query))
}

fn token_from_query(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            let key = split.next()?;
            let value = split.next().unwrap_or_default();
            Some((key, value))
        })
        .find(|(key, value)| *key == "token" && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
