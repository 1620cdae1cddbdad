//! # Authentication API
//!
//! Login issues an opaque session token; every admin request is then
//! validated by the session middleware (expiry check + sliding renewal,
//! see `crate::session`).
//!
//! ## Endpoints
//!
//! - `POST /v1/auth/login` — public; issues a session token
//! - `POST /v1/auth/logout` — revokes the presented session
//! - `GET /v1/auth/session` — introspects the presented session

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use emlak_core::{Role, UserId};

use crate::audit;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::session::{CallerIdentity, SessionTtl};
use crate::state::AppState;

// ── DTOs ────────────────────────────────────────────────────────────

/// Login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Use the extended session lifetime.
    #[serde(default)]
    pub remember_me: bool,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username must not be empty".to_string());
        }
        if self.password.is_empty() {
            return Err("password must not be empty".to_string());
        }
        Ok(())
    }
}

/// Public view of the logged-in user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

/// Login response: the token is shown exactly once.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

/// Session introspection response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionInfoResponse {
    pub username: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub remember: bool,
}

// ── Routers ─────────────────────────────────────────────────────────

/// Public auth routes (login only).
pub fn public_router() -> Router<AppState> {
    Router::new().route("/v1/auth/login", post(login))
}

/// Session-guarded auth routes.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/session", get(session_info))
}

fn ttl(state: &AppState) -> SessionTtl {
    SessionTtl::from_secs(
        state.config.session_ttl_secs,
        state.config.remember_ttl_secs,
    )
}

fn presented_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/auth/login — Authenticate and open a session.
///
/// Failed attempts are audited with the username but never the
/// password; the response does not reveal whether the username or the
/// password was wrong.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let username = req.username.trim().to_string();

    let user = match state.users.find(|u| u.username == username) {
        Some(u) if u.active && u.password.verify(&req.password) => u,
        _ => {
            audit::record(
                &state,
                &username,
                "login_failed",
                "session",
                &username,
                serde_json::json!({}),
            )
            .await;
            return Err(AppError::Unauthorized("invalid credentials".to_string()));
        }
    };

    let (token, record) = state.sessions.create(&user, req.remember_me, ttl(&state));

    let updated = state.users.update(&user.id, |u| {
        u.last_login_at = Some(record.issued_at);
    });
    if let (Some(pool), Some(updated)) = (&state.db_pool, updated) {
        if let Err(e) = crate::db::users::update(pool, &updated).await {
            tracing::warn!(user_id = %user.id, error = %e, "failed to persist last_login_at");
        }
    }

    audit::record(
        &state,
        &user.username,
        "login",
        "session",
        &user.username,
        serde_json::json!({"remember_me": req.remember_me}),
    )
    .await;

    Ok(Json(LoginResponse {
        token,
        expires_at: record.expires_at,
        user: SessionUser {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            role: user.role,
        },
    }))
}

/// POST /v1/auth/logout — Revoke the presented session.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "No valid session", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub(crate) async fn logout(
    State(state): State<AppState>,
    caller: CallerIdentity,
    headers: HeaderMap,
) -> Result<axum::http::StatusCode, AppError> {
    let token = presented_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    state.sessions.revoke(&token);

    audit::record(
        &state,
        &caller.username,
        "logout",
        "session",
        &caller.username,
        serde_json::json!({}),
    )
    .await;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// GET /v1/auth/session — Introspect the presented session.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session details", body = SessionInfoResponse),
        (status = 401, description = "No valid session", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub(crate) async fn session_info(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    headers: HeaderMap,
) -> Result<Json<SessionInfoResponse>, AppError> {
    let token = presented_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    let record = state
        .sessions
        .peek(&token)
        .ok_or_else(|| AppError::Unauthorized("invalid or expired session".to_string()))?;

    Ok(Json(SessionInfoResponse {
        username: record.username,
        role: record.role,
        issued_at: record.issued_at,
        expires_at: record.expires_at,
        remember: record.remember,
    }))
}
