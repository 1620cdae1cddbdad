//! # Activity Log API
//!
//! Read-only audit console for admins: query the event log and verify
//! the hash chain.
//!
//! ## Endpoints
//!
//! - `GET /v1/activity` — paginated events, newest first, filterable by
//!   resource
//! - `GET /v1/activity/verify` — chain integrity check

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use emlak_core::{ActivityRecord, ChainIntegrity, Role};
use emlak_query::{Page, PageRequest, Pagination};

use crate::error::AppError;
use crate::session::{require_role, CallerIdentity};
use crate::state::AppState;

/// Query parameters for listing activity events.
#[derive(Debug, Deserialize, Default)]
pub struct ActivityListParams {
    /// Filter by resource kind (e.g. `property`).
    pub resource_type: Option<String>,
    /// Filter by resource id.
    pub resource_id: Option<String>,
    /// Filter by actor username.
    pub actor: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Build the activity router (admin role enforced per handler).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/activity", get(list_activity))
        .route("/v1/activity/verify", get(verify_activity))
}

/// GET /v1/activity — List audit events, newest first.
#[utoipa::path(
    get,
    path = "/v1/activity",
    responses(
        (status = 200, description = "Paginated audit events"),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
    ),
    tag = "activity"
)]
pub(crate) async fn list_activity(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(params): Query<ActivityListParams>,
) -> Result<Json<Page<ActivityRecord>>, AppError> {
    require_role(&caller, Role::Admin)?;

    let mut matched: Vec<ActivityRecord> = state
        .activity
        .list()
        .into_iter()
        .filter(|e| {
            if let Some(ref rt) = params.resource_type {
                if &e.resource_type != rt {
                    return false;
                }
            }
            if let Some(ref rid) = params.resource_id {
                if &e.resource_id != rid {
                    return false;
                }
            }
            if let Some(ref actor) = params.actor {
                if &e.actor != actor {
                    return false;
                }
            }
            true
        })
        .collect();
    // The log is stored in chain order; the console reads newest first.
    matched.reverse();

    let request = PageRequest::from_params(params.page.as_deref(), params.limit.as_deref());
    let pagination = Pagination::compute(matched.len() as u64, request);
    let items = emlak_query::page::window(&matched, request);
    Ok(Json(Page { items, pagination }))
}

/// GET /v1/activity/verify — Verify hash-chain integrity.
#[utoipa::path(
    get,
    path = "/v1/activity/verify",
    responses(
        (status = 200, description = "Chain integrity result", body = ChainIntegrity),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
    ),
    tag = "activity"
)]
pub(crate) async fn verify_activity(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<ChainIntegrity>, AppError> {
    require_role(&caller, Role::Admin)?;
    Ok(Json(state.activity.verify()))
}
