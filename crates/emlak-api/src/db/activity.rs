//! Activity event persistence — immutable hash chain.
//!
//! Events are chained in memory (see `state::ActivityLog`) and appended
//! here verbatim, so the chain spans restarts: hydration restores the
//! persisted tail and new appends continue from its head.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use emlak_core::{ActivityId, ActivityRecord};

/// Append an already-chained activity event.
pub async fn append(pool: &PgPool, event: &ActivityRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO activity_events (id, actor, action, resource_type, resource_id,
         metadata, previous_hash, event_hash, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(event.id.as_uuid())
    .bind(&event.actor)
    .bind(&event.action)
    .bind(&event.resource_type)
    .bind(&event.resource_id)
    .bind(&event.metadata)
    .bind(&event.previous_hash)
    .bind(&event.event_hash)
    .bind(event.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the full event log in chain order for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ActivityRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ActivityRow>(
        "SELECT id, actor, action, resource_type, resource_id, metadata,
         previous_hash, event_hash, created_at
         FROM activity_events ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ActivityRow::into_record).collect())
}

/// Query events for a specific resource, in chain order.
pub async fn events_for_resource(
    pool: &PgPool,
    resource_type: &str,
    resource_id: &str,
) -> Result<Vec<ActivityRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ActivityRow>(
        "SELECT id, actor, action, resource_type, resource_id, metadata,
         previous_hash, event_hash, created_at
         FROM activity_events
         WHERE resource_type = $1 AND resource_id = $2
         ORDER BY created_at ASC",
    )
    .bind(resource_type)
    .bind(resource_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ActivityRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    actor: String,
    action: String,
    resource_type: String,
    resource_id: String,
    metadata: serde_json::Value,
    previous_hash: String,
    event_hash: String,
    created_at: DateTime<Utc>,
}

impl ActivityRow {
    fn into_record(self) -> ActivityRecord {
        ActivityRecord {
            id: ActivityId::from_uuid(self.id),
            actor: self.actor,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            metadata: self.metadata,
            previous_hash: self.previous_hash,
            event_hash: self.event_hash,
            created_at: self.created_at,
        }
    }
}
