//! User persistence operations.
//!
//! The password digest travels through its stored string form and never
//! appears in serialized responses (`UserRecord` skips it).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use emlak_core::{PasswordDigest, Role, UserId, UserRecord};

fn role_token(role: Role) -> &'static str {
    role.as_str()
}

/// Insert a new user record.
pub async fn insert(pool: &PgPool, record: &UserRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, username, display_name, email, role, password_digest,
         active, last_login_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(record.id.as_uuid())
    .bind(&record.username)
    .bind(&record.display_name)
    .bind(&record.email)
    .bind(role_token(record.role))
    .bind(record.password.as_stored())
    .bind(record.active)
    .bind(record.last_login_at)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace a user record (write-through after an in-memory update).
pub async fn update(pool: &PgPool, record: &UserRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET username = $2, display_name = $3, email = $4, role = $5,
         password_digest = $6, active = $7, last_login_at = $8, updated_at = $9
         WHERE id = $1",
    )
    .bind(record.id.as_uuid())
    .bind(&record.username)
    .bind(&record.display_name)
    .bind(&record.email)
    .bind(role_token(record.role))
    .bind(record.password.as_stored())
    .bind(record.active)
    .bind(record.last_login_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Hard delete a user row.
pub async fn delete(pool: &PgPool, id: &UserId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all users for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, display_name, email, role, password_digest, active,
         last_login_at, created_at, updated_at
         FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(UserRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    display_name: String,
    email: String,
    role: String,
    password_digest: String,
    active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        let role: Role = self.role.parse().unwrap_or_else(|e| {
            tracing::error!(
                id = %self.id,
                value = %self.role,
                error = %e,
                "unknown role in database — defaulting to agent; \
                 investigate possible data corruption"
            );
            Role::Agent
        });

        UserRecord {
            id: UserId::from_uuid(self.id),
            username: self.username,
            display_name: self.display_name,
            email: self.email,
            role,
            password: PasswordDigest::from_stored(self.password_digest),
            active: self.active,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
