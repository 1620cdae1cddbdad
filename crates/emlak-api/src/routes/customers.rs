//! # CRM Customers API
//!
//! Back-office customer tracker: CRUD plus interaction logging.
//!
//! ## Endpoints
//!
//! - `GET /v1/customers` — list with filters and pagination
//! - `POST /v1/customers` — create customer
//! - `GET /v1/customers/:id` — get customer
//! - `PUT /v1/customers/:id` — update customer
//! - `DELETE /v1/customers/:id` — delete customer
//! - `POST /v1/customers/:id/interactions` — append an interaction

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use emlak_core::crm::{CustomerType, Interaction, InteractionKind};
use emlak_core::{CustomerId, CustomerRecord, UserId};
use emlak_query::{Page, PageRequest, Pagination};

use crate::audit;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::session::CallerIdentity;
use crate::state::AppState;

// ── Request DTOs ────────────────────────────────────────────────────

/// Request to create a customer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub customer_type: CustomerType,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub assigned_agent: Option<UserId>,
}

impl Validate for CreateCustomerRequest {
    fn validate(&self) -> Result<(), String> {
        if self.full_name.trim().is_empty() {
            return Err("full_name must not be empty".to_string());
        }
        if self.phone.trim().is_empty() {
            return Err("phone must not be empty".to_string());
        }
        Ok(())
    }
}

/// Request to update a customer. Absent fields stay untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateCustomerRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub customer_type: Option<CustomerType>,
    pub note: Option<String>,
    pub assigned_agent: Option<UserId>,
}

impl Validate for UpdateCustomerRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref name) = self.full_name {
            if name.trim().is_empty() {
                return Err("full_name must not be empty if provided".to_string());
            }
        }
        Ok(())
    }
}

/// Request to append an interaction.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddInteractionRequest {
    pub kind: InteractionKind,
    pub note: String,
    /// Defaults to now when absent.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl Validate for AddInteractionRequest {
    fn validate(&self) -> Result<(), String> {
        if self.note.trim().is_empty() {
            return Err("note must not be empty".to_string());
        }
        Ok(())
    }
}

/// Query parameters for listing customers.
#[derive(Debug, Deserialize, Default)]
pub struct CustomerListParams {
    /// Filter by customer type token (e.g. `buyer`).
    pub customer_type: Option<String>,
    /// Filter by assigned agent id.
    pub assigned_agent: Option<Uuid>,
    /// Case-insensitive substring over name/phone/email.
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the customers router (admin only).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/customers", get(list_customers).post(create_customer))
        .route(
            "/v1/customers/:id",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
        .route("/v1/customers/:id/interactions", axum::routing::post(add_interaction))
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /v1/customers — List customers with optional filtering.
///
/// Same degradation policy as the listing search: malformed filter
/// values act as "no constraint".
#[utoipa::path(
    get,
    path = "/v1/customers",
    responses((status = 200, description = "Paginated customer list")),
    tag = "customers"
)]
pub(crate) async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<CustomerListParams>,
) -> Json<Page<CustomerRecord>> {
    let wanted_type: Option<CustomerType> =
        params.customer_type.as_deref().and_then(|t| t.parse().ok());
    let needle = params.search.as_deref().map(str::to_lowercase);

    let mut matched: Vec<CustomerRecord> = state
        .customers
        .list()
        .into_iter()
        .filter(|c| {
            if let Some(t) = wanted_type {
                if c.customer_type != t {
                    return false;
                }
            }
            if let Some(agent) = params.assigned_agent {
                if c.assigned_agent.map(|a| *a.as_uuid()) != Some(agent) {
                    return false;
                }
            }
            if let Some(ref needle) = needle {
                let email = c.email.as_deref().unwrap_or("");
                if !c.full_name.to_lowercase().contains(needle)
                    && !c.phone.to_lowercase().contains(needle)
                    && !email.to_lowercase().contains(needle)
                {
                    return false;
                }
            }
            true
        })
        .collect();
    // Newest customers first, deterministic across equal timestamps.
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

    let request = PageRequest::from_params(params.page.as_deref(), params.limit.as_deref());
    let pagination = Pagination::compute(matched.len() as u64, request);
    let items = emlak_query::page::window(&matched, request);
    Json(Page { items, pagination })
}

/// POST /v1/customers — Create a customer.
#[utoipa::path(
    post,
    path = "/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerRecord),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
pub(crate) async fn create_customer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<CustomerRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let now = Utc::now();

    let record = CustomerRecord {
        id: CustomerId::new(),
        full_name: req.full_name,
        phone: req.phone,
        email: req.email,
        customer_type: req.customer_type,
        note: req.note,
        assigned_agent: req.assigned_agent,
        interactions: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    state.customers.insert(record.id, record.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::customers::insert(pool, &record).await {
            tracing::error!(customer_id = %record.id, error = %e, "failed to persist customer");
            return Err(AppError::Internal(
                "customer created in-memory but database persist failed".to_string(),
            ));
        }
    }

    audit::record(
        &state,
        &caller.username,
        "create",
        "customer",
        record.id,
        serde_json::json!({"customer_type": record.customer_type}),
    )
    .await;

    Ok((axum::http::StatusCode::CREATED, Json(record)))
}

/// GET /v1/customers/:id — Get a single customer.
#[utoipa::path(
    get,
    path = "/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerRecord),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
pub(crate) async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerRecord>, AppError> {
    let id = CustomerId::from_uuid(id);
    state
        .customers
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))
}

/// PUT /v1/customers/:id — Update a customer.
#[utoipa::path(
    put,
    path = "/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerRecord),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
pub(crate) async fn update_customer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateCustomerRequest>, JsonRejection>,
) -> Result<Json<CustomerRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let id = CustomerId::from_uuid(id);

    let record = state
        .customers
        .update(&id, |c| {
            if let Some(name) = req.full_name {
                c.full_name = name;
            }
            if let Some(phone) = req.phone {
                c.phone = phone;
            }
            if let Some(email) = req.email {
                c.email = Some(email);
            }
            if let Some(t) = req.customer_type {
                c.customer_type = t;
            }
            if let Some(note) = req.note {
                c.note = note;
            }
            if let Some(agent) = req.assigned_agent {
                c.assigned_agent = Some(agent);
            }
            c.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::customers::update(pool, &record).await {
            tracing::error!(customer_id = %id, error = %e, "failed to persist customer update");
            return Err(AppError::Internal(
                "customer updated in-memory but database persist failed".to_string(),
            ));
        }
    }

    audit::record(&state, &caller.username, "update", "customer", id, serde_json::json!({}))
        .await;

    Ok(Json(record))
}

/// DELETE /v1/customers/:id — Delete a customer.
#[utoipa::path(
    delete,
    path = "/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
pub(crate) async fn delete_customer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, AppError> {
    let id = CustomerId::from_uuid(id);
    state
        .customers
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::customers::delete(pool, &id).await {
            tracing::error!(customer_id = %id, error = %e, "failed to delete customer row");
            return Err(AppError::Internal(
                "customer removed in-memory but database delete failed".to_string(),
            ));
        }
    }

    audit::record(&state, &caller.username, "delete", "customer", id, serde_json::json!({}))
        .await;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// POST /v1/customers/:id/interactions — Append an interaction.
#[utoipa::path(
    post,
    path = "/v1/customers/{id}/interactions",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = AddInteractionRequest,
    responses(
        (status = 200, description = "Interaction recorded", body = CustomerRecord),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
pub(crate) async fn add_interaction(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<AddInteractionRequest>, JsonRejection>,
) -> Result<Json<CustomerRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let id = CustomerId::from_uuid(id);

    let interaction = Interaction {
        id: Uuid::new_v4(),
        kind: req.kind,
        note: req.note,
        agent_id: Some(caller.user_id),
        occurred_at: req.occurred_at.unwrap_or_else(Utc::now),
    };

    let record = state
        .customers
        .update(&id, |c| {
            c.interactions.push(interaction.clone());
            c.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::customers::update(pool, &record).await {
            tracing::error!(customer_id = %id, error = %e, "failed to persist interaction");
            return Err(AppError::Internal(
                "interaction recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    audit::record(
        &state,
        &caller.username,
        "add_interaction",
        "customer",
        id,
        serde_json::json!({"kind": interaction.kind}),
    )
    .await;

    Ok(Json(record))
}
