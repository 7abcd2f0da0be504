use axum::{
    body::Body,
    extract::{Extension, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::auth::{cookies, jwt, middleware::AuthUser, password};
use crate::domain::KanbanError;
use crate::services::demo_board;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Tokens are also set as cookies; the body copy serves non-browser clients.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPassword {
    pub id: String,
    pub password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct RefreshTokenRow {
    pub id: String,
    pub user_id: String,
}

async fn fetch_user(
    db: &sqlx::SqlitePool,
    user_id: &str,
) -> Result<Option<UserResponse>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, email, full_name, avatar_url, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
}

fn normalize_email(raw: &str) -> Result<String, KanbanError> {
    let email = raw.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(KanbanError::BadRequest("A valid email is required".into()));
    }
    Ok(email)
}

async fn issue_tokens(
    pool: &sqlx::SqlitePool,
    user_id: &str,
) -> Result<(String, String), KanbanError> {
    let signing_key = jwt::get_or_create_signing_key(pool)
        .await
        .map_err(|e| KanbanError::Internal(format!("Failed to load JWT signing key: {}", e)))?;
    let token = jwt::create_token(&signing_key, user_id)
        .map_err(|e| KanbanError::Internal(format!("Failed to create JWT token: {}", e)))?;

    let refresh_token = jwt::create_refresh_token();
    let refresh_token_hash = jwt::hash_refresh_token(&refresh_token);
    let now = chrono::Utc::now();
    let created_at = now.to_rfc3339();
    let expires_at = (now + chrono::Duration::days(jwt::REFRESH_TOKEN_TTL_DAYS)).to_rfc3339();

    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at, revoked) VALUES (?, ?, ?, ?, ?, 0)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(refresh_token_hash)
    .bind(expires_at)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok((token, refresh_token))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, KanbanError> {
    let email = normalize_email(&req.email)?;
    password::check_strength(&req.password).map_err(KanbanError::BadRequest)?;
    let full_name = req
        .full_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let db = state.require_db()?;

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(db)
        .await?;

    if existing.is_some() {
        return Err(KanbanError::BadRequest("Email is already registered".into()));
    }

    let password_hash = password::hash_password(&req.password)
        .map_err(|e| KanbanError::Internal(format!("Failed to hash password: {}", e)))?;

    let user_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, email, full_name, avatar_url, password_hash, created_at, updated_at) VALUES (?, ?, ?, NULL, ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(&email)
    .bind(&full_name)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await
    .map_err(|err| {
        if err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation())
        {
            KanbanError::BadRequest("Email is already registered".into())
        } else {
            KanbanError::Database(err)
        }
    })?;

    tracing::info!(user_id = %user_id, "User registered");

    if state.config.seed_demo_board {
        if let Err(e) = demo_board::seed_demo_board(db, &user_id).await {
            tracing::warn!("Failed to seed demo board for {}: {}", user_id, e);
        }
    }

    let (token, refresh_token) = issue_tokens(db, &user_id).await?;
    let user = UserResponse {
        id: user_id,
        email,
        full_name,
        avatar_url: None,
        created_at: now.clone(),
        updated_at: now,
    };

    build_auth_response(StatusCode::CREATED, user, token, refresh_token, state.config.cookie_secure)
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, KanbanError> {
    let email = req.email.trim().to_lowercase();
    let db = state.require_db()?;

    let user: UserWithPassword =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| KanbanError::Unauthorized("Invalid email or password".into()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)
        .map_err(|e| KanbanError::Internal(format!("Failed to verify password: {}", e)))?;

    if !valid {
        return Err(KanbanError::Unauthorized("Invalid email or password".into()));
    }

    let profile = fetch_user(db, &user.id)
        .await?
        .ok_or_else(|| KanbanError::Unauthorized("Invalid email or password".into()))?;
    let (token, refresh_token) = issue_tokens(db, &user.id).await?;

    build_auth_response(StatusCode::OK, profile, token, refresh_token, state.config.cookie_secure)
}

/// Rotates a refresh token: the presented one is revoked and a new pair
/// issued.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: Option<Json<RefreshRequest>>,
) -> Result<Response, KanbanError> {
    let db = state.require_db()?;
    let presented = cookies::cookie_value(&headers, cookies::REFRESH_TOKEN_COOKIE)
        .or_else(|| req.map(|Json(body)| body.refresh_token.trim().to_string()))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| KanbanError::Unauthorized("Invalid refresh token".into()))?;
    let token_hash = jwt::hash_refresh_token(&presented);
    let now = chrono::Utc::now().to_rfc3339();

    let row: RefreshTokenRow = sqlx::query_as(
        "SELECT id, user_id FROM refresh_tokens WHERE token_hash = ? AND revoked = 0 AND expires_at > ? ORDER BY created_at DESC LIMIT 1",
    )
    .bind(token_hash)
    .bind(now)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| KanbanError::Unauthorized("Invalid refresh token".into()))?;

    // Only one caller may claim a given token; a concurrent replay loses here.
    let claimed = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ? AND revoked = 0")
        .bind(&row.id)
        .execute(db)
        .await?
        .rows_affected();
    if claimed == 0 {
        tracing::warn!(user_id = %row.user_id, "Refresh token replayed");
        return Err(KanbanError::Unauthorized("Invalid refresh token".into()));
    }

    let user = fetch_user(db, &row.user_id)
        .await?
        .ok_or_else(|| KanbanError::Unauthorized("Invalid refresh token".into()))?;

    let (token, refresh_token) = issue_tokens(db, &user.id).await?;

    build_auth_response(StatusCode::OK, user, token, refresh_token, state.config.cookie_secure)
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, KanbanError> {
    let db = state.require_db()?;

    if let Some(refresh_token) = cookies::cookie_value(&headers, cookies::REFRESH_TOKEN_COOKIE) {
        let token_hash = jwt::hash_refresh_token(refresh_token.trim());

        sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE token_hash = ?")
            .bind(token_hash)
            .execute(db)
            .await?;
    }

    let secure = state.config.cookie_secure;
    let clear_access_cookie = cookies::build_clear_cookie(cookies::ACCESS_TOKEN_COOKIE, secure);
    let clear_refresh_cookie = cookies::build_clear_cookie(cookies::REFRESH_TOKEN_COOKIE, secure);

    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::SET_COOKIE, clear_access_cookie)
        .header(header::SET_COOKIE, clear_refresh_cookie)
        .body(Body::empty())
        .map_err(|e| KanbanError::Internal(format!("Failed to build auth response: {}", e)))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, KanbanError> {
    let db = state.require_db()?;

    let user = fetch_user(db, &auth_user.user_id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("User not found".into()))?;

    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, KanbanError> {
    let db = state.require_db()?;

    let existing = fetch_user(db, &auth_user.user_id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("User not found".into()))?;

    let full_name = crate::domain::fields::patch_optional(existing.full_name, req.full_name);
    let avatar_url = crate::domain::fields::patch_optional(existing.avatar_url, req.avatar_url);
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE users SET full_name = ?, avatar_url = ?, updated_at = ? WHERE id = ?")
        .bind(&full_name)
        .bind(&avatar_url)
        .bind(&now)
        .bind(&auth_user.user_id)
        .execute(db)
        .await?;

    let user = fetch_user(db, &auth_user.user_id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("User not found".into()))?;

    Ok(Json(user))
}

/// Changing the password signs the user out everywhere else.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, KanbanError> {
    let db = state.require_db()?;
    password::check_strength(&req.new_password).map_err(KanbanError::BadRequest)?;

    let current_hash: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(&auth_user.user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| KanbanError::NotFound("User not found".into()))?;

    let valid = password::verify_password(&req.current_password, &current_hash)
        .map_err(|e| KanbanError::Internal(format!("Failed to verify password: {}", e)))?;
    if !valid {
        return Err(KanbanError::Unauthorized("Current password is incorrect".into()));
    }

    let new_hash = password::hash_password(&req.new_password)
        .map_err(|e| KanbanError::Internal(format!("Failed to hash password: {}", e)))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&new_hash)
        .bind(&now)
        .bind(&auth_user.user_id)
        .execute(db)
        .await?;

    sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE user_id = ?")
        .bind(&auth_user.user_id)
        .execute(db)
        .await?;

    tracing::info!(user_id = %auth_user.user_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

fn build_auth_response(
    status: StatusCode,
    user: UserResponse,
    access_token: String,
    refresh_token: String,
    secure: bool,
) -> Result<Response, KanbanError> {
    let access_cookie = cookies::build_token_cookie(
        cookies::ACCESS_TOKEN_COOKIE,
        &access_token,
        jwt::ACCESS_TOKEN_TTL_SECS,
        secure,
    );
    let refresh_cookie = cookies::build_token_cookie(
        cookies::REFRESH_TOKEN_COOKIE,
        &refresh_token,
        jwt::REFRESH_TOKEN_TTL_DAYS * 24 * 60 * 60,
        secure,
    );
    let response_body = Json(AuthResponse {
        user,
        access_token,
        refresh_token,
        expires_in: jwt::ACCESS_TOKEN_TTL_SECS,
    })
    .into_response()
    .into_body();

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::SET_COOKIE, access_cookie)
        .header(header::SET_COOKIE, refresh_cookie)
        .body(response_body)
        .map_err(|e| KanbanError::Internal(format!("Failed to build auth response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ada@").is_err());
    }
}
