//! # User Management API
//!
//! Admin-only management of back-office accounts. Responses never carry
//! password material (`UserRecord` excludes the digest from
//! serialization entirely).
//!
//! ## Endpoints
//!
//! - `GET /v1/users` — list users
//! - `POST /v1/users` — create user
//! - `GET /v1/users/:id` — get user
//! - `PUT /v1/users/:id` — update user (role, password, activation)
//! - `DELETE /v1/users/:id` — delete user

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use emlak_core::{PasswordDigest, Role, UserId, UserRecord};

use crate::audit;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::session::{require_role, CallerIdentity};
use crate::state::AppState;

// ── Request DTOs ────────────────────────────────────────────────────

/// Request to create a user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    pub password: String,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username must not be empty".to_string());
        }
        if self.username.trim().len() < 3 {
            return Err("username must be at least 3 characters".to_string());
        }
        if self.password.len() < 8 {
            return Err("password must be at least 8 characters".to_string());
        }
        Ok(())
    }
}

/// Request to update a user. Absent fields stay untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    /// Setting a new password revokes the user's existing sessions.
    pub password: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref password) = self.password {
            if password.len() < 8 {
                return Err("password must be at least 8 characters".to_string());
            }
        }
        Ok(())
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the users router (admin role enforced per handler).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/users", get(list_users).post(create_user))
        .route(
            "/v1/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /v1/users — List all users.
#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "User list", body = Vec<UserRecord>),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    require_role(&caller, Role::Admin)?;
    let mut users = state.users.list();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(Json(users))
}

/// POST /v1/users — Create a user.
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserRecord),
        (status = 409, description = "Username already taken", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<UserRecord>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;
    let username = req.username.trim().to_string();

    if state.users.find(|u| u.username == username).is_some() {
        return Err(AppError::Conflict(format!(
            "username '{username}' is already taken"
        )));
    }

    let now = Utc::now();
    let record = UserRecord {
        id: UserId::new(),
        username,
        display_name: req.display_name,
        email: req.email,
        role: req.role,
        password: PasswordDigest::derive(&req.password),
        active: true,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    };

    state.users.insert(record.id, record.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::users::insert(pool, &record).await {
            tracing::error!(user_id = %record.id, error = %e, "failed to persist user");
            return Err(AppError::Internal(
                "user created in-memory but database persist failed".to_string(),
            ));
        }
    }

    audit::record(
        &state,
        &caller.username,
        "create",
        "user",
        record.id,
        serde_json::json!({"username": record.username, "role": record.role}),
    )
    .await;

    Ok((axum::http::StatusCode::CREATED, Json(record)))
}

/// GET /v1/users/:id — Get a single user.
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserRecord),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<UserRecord>, AppError> {
    require_role(&caller, Role::Admin)?;
    let id = UserId::from_uuid(id);
    state
        .users
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
}

/// PUT /v1/users/:id — Update a user.
#[utoipa::path(
    put,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserRecord),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn update_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserRecord>, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;
    let id = UserId::from_uuid(id);

    let password_changed = req.password.is_some();
    let deactivated = req.active == Some(false);

    let record = state
        .users
        .update(&id, |u| {
            if let Some(name) = req.display_name {
                u.display_name = name;
            }
            if let Some(email) = req.email {
                u.email = email;
            }
            if let Some(role) = req.role {
                u.role = role;
            }
            if let Some(active) = req.active {
                u.active = active;
            }
            if let Some(password) = req.password {
                u.password = PasswordDigest::derive(&password);
            }
            u.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;

    // A changed password or deactivation invalidates existing sessions.
    if password_changed || deactivated {
        let revoked = state.sessions.revoke_user(&id);
        tracing::info!(user_id = %id, revoked, "revoked sessions after account change");
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::users::update(pool, &record).await {
            tracing::error!(user_id = %id, error = %e, "failed to persist user update");
            return Err(AppError::Internal(
                "user updated in-memory but database persist failed".to_string(),
            ));
        }
    }

    audit::record(
        &state,
        &caller.username,
        "update",
        "user",
        id,
        serde_json::json!({"password_changed": password_changed, "deactivated": deactivated}),
    )
    .await;

    Ok(Json(record))
}

/// DELETE /v1/users/:id — Delete a user.
#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
        (status = 409, description = "Cannot delete own account", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    let id = UserId::from_uuid(id);

    if caller.user_id == id {
        return Err(AppError::Conflict(
            "cannot delete the account you are logged in with".to_string(),
        ));
    }

    let record = state
        .users
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;

    state.sessions.revoke_user(&id);

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::users::delete(pool, &id).await {
            tracing::error!(user_id = %id, error = %e, "failed to delete user row");
            return Err(AppError::Internal(
                "user removed in-memory but database delete failed".to_string(),
            ));
        }
    }

    audit::record(
        &state,
        &caller.username,
        "delete",
        "user",
        id,
        serde_json::json!({"username": record.username}),
    )
    .await;

    Ok(axum::http::StatusCode::NO_CONTENT)
}
