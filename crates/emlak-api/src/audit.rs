//! # Audit Recording
//!
//! One helper every mutating handler calls: append to the in-memory
//! chain, then write through to Postgres when configured.
//!
//! Audit persistence failure is logged but never fails the mutation —
//! the primary record is already committed, and the in-memory chain
//! still carries the event for this process lifetime.

use crate::state::AppState;

/// Record a back-office action in the activity log.
pub async fn record(
    state: &AppState,
    actor: &str,
    action: &str,
    resource_type: &str,
    resource_id: impl std::fmt::Display,
    metadata: serde_json::Value,
) {
    let event = state.activity.append(
        actor,
        action,
        resource_type,
        resource_id.to_string(),
        metadata,
    );

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::activity::append(pool, &event).await {
            tracing::error!(
                event_id = %event.id,
                action,
                resource_type,
                error = %e,
                "failed to persist activity event"
            );
        }
    }
}
