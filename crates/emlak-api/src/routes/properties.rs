//! # Property Listings API
//!
//! Public search and detail endpoints plus the admin CRUD surface.
//!
//! ## Endpoints
//!
//! Public:
//! - `GET /v1/properties` — filtered/sorted/paginated listing search
//! - `GET /v1/properties/:id` — detail by id
//! - `GET /v1/properties/slug/:slug` — detail by slug
//! - `POST /v1/properties/:id/view` — increment view counter
//!
//! Admin (session required):
//! - `POST /v1/properties` — create listing
//! - `PUT /v1/properties/:id` — partial update (listing type immutable)
//! - `DELETE /v1/properties/:id` — hard delete, cascades CDN media

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use emlak_core::property::{
    make_slug, BuildingFeatures, Category, ExteriorFeatures, InteriorFeatures, ListingType,
    Location, Media, PropertyDetails, PropertyRecord, PropertyStatus, Specs,
};
use emlak_core::PropertyId;
use emlak_query::{query_store, ListingQuery, Page};

use crate::audit;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::session::CallerIdentity;
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to create a new listing.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePropertyRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub listing_type: ListingType,
    pub category: Category,
    pub price: u64,
    #[serde(default)]
    pub monthly_fee: Option<u64>,
    pub location: Location,
    pub specs: Specs,
    #[serde(default)]
    pub interior_features: InteriorFeatures,
    #[serde(default)]
    pub exterior_features: ExteriorFeatures,
    #[serde(default)]
    pub building_features: BuildingFeatures,
    #[serde(default)]
    pub property_details: Option<PropertyDetails>,
    #[serde(default)]
    pub media: Media,
    /// Initial status; defaults to `active`.
    #[serde(default)]
    pub status: Option<PropertyStatus>,
}

impl Validate for CreatePropertyRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.location.city.trim().is_empty() {
            return Err("location.city must not be empty".to_string());
        }
        if self.location.country.trim().is_empty() {
            return Err("location.country must not be empty".to_string());
        }
        Ok(())
    }
}

/// Request to update an existing listing. Absent fields stay untouched.
/// `listing_type`, `created_at` and `view_count` cannot be changed here.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdatePropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: Option<u64>,
    pub monthly_fee: Option<u64>,
    pub location: Option<Location>,
    pub specs: Option<Specs>,
    pub interior_features: Option<InteriorFeatures>,
    pub exterior_features: Option<ExteriorFeatures>,
    pub building_features: Option<BuildingFeatures>,
    pub property_details: Option<PropertyDetails>,
    pub media: Option<Media>,
    pub status: Option<PropertyStatus>,
}

impl Validate for UpdatePropertyRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                return Err("title must not be empty if provided".to_string());
            }
        }
        if let Some(ref location) = self.location {
            if location.city.trim().is_empty() {
                return Err("location.city must not be empty if provided".to_string());
            }
        }
        Ok(())
    }
}

/// Response for the view-count endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ViewCountResponse {
    pub id: PropertyId,
    pub view_count: u64,
}

// ── Routers ─────────────────────────────────────────────────────────

/// Public, unauthenticated listing routes.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/v1/properties", get(list_properties))
        .route("/v1/properties/:id", get(get_property))
        .route("/v1/properties/slug/:slug", get(get_property_by_slug))
        .route("/v1/properties/:id/view", post(record_view))
}

/// Admin mutation routes, mounted behind the session middleware.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/v1/properties", post(create_property))
        .route(
            "/v1/properties/:id",
            axum::routing::put(update_property).delete(delete_property),
        )
}

// ── Public handlers ─────────────────────────────────────────────────

/// GET /v1/properties — Search listings.
///
/// Accepts the full filter vocabulary as query parameters plus
/// `sort_by`, `page` and `limit`. Unknown parameters are ignored;
/// malformed values degrade to "no constraint". Without an explicit
/// `status` filter only active listings are returned.
///
/// With a database configured the search runs as a store-level SQL
/// query; without one it runs against the in-memory store. Both paths
/// share the pipeline semantics and return identical results for the
/// same record set.
#[utoipa::path(
    get,
    path = "/v1/properties",
    responses(
        (status = 200, description = "Paginated listing results"),
    ),
    tag = "properties"
)]
pub(crate) async fn list_properties(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<PropertyRecord>>, AppError> {
    let mut query =
        ListingQuery::from_query_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    query.criteria = query.criteria.with_default_status(PropertyStatus::Active);

    let page = match &state.db_pool {
        Some(pool) => {
            let store = crate::db::properties::PgPropertyStore::new(pool.clone());
            query_store(&store, &query).await?
        }
        None => query_store(&state.properties, &query).await?,
    };
    Ok(Json(page))
}

/// GET /v1/properties/:id — Get a single listing by id.
#[utoipa::path(
    get,
    path = "/v1/properties/{id}",
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Listing found", body = PropertyRecord),
        (status = 404, description = "Listing not found", body = crate::error::ErrorBody),
    ),
    tag = "properties"
)]
pub(crate) async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PropertyRecord>, AppError> {
    let id = PropertyId::from_uuid(id);
    state
        .properties
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("property {id} not found")))
}

/// GET /v1/properties/slug/:slug — Get a single listing by slug.
#[utoipa::path(
    get,
    path = "/v1/properties/slug/{slug}",
    params(("slug" = String, Path, description = "Listing slug")),
    responses(
        (status = 200, description = "Listing found", body = PropertyRecord),
        (status = 404, description = "Listing not found", body = crate::error::ErrorBody),
    ),
    tag = "properties"
)]
pub(crate) async fn get_property_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PropertyRecord>, AppError> {
    state
        .properties
        .get_by_slug(&slug)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("property with slug '{slug}' not found")))
}

/// POST /v1/properties/:id/view — Record one public detail-page view.
///
/// Deliberately does not bump `updated_at`: view traffic is not an
/// editorial change.
#[utoipa::path(
    post,
    path = "/v1/properties/{id}/view",
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "View recorded", body = ViewCountResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorBody),
    ),
    tag = "properties"
)]
pub(crate) async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ViewCountResponse>, AppError> {
    let id = PropertyId::from_uuid(id);
    let record = state
        .properties
        .update(&id, |p| p.view_count += 1)
        .ok_or_else(|| AppError::NotFound(format!("property {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::properties::update(pool, &record).await {
            // A lost view count is not worth a user-facing 500.
            tracing::warn!(property_id = %id, error = %e, "failed to persist view count");
        }
    }

    Ok(Json(ViewCountResponse {
        id,
        view_count: record.view_count,
    }))
}

// ── Admin handlers ──────────────────────────────────────────────────

/// POST /v1/properties — Create a listing.
#[utoipa::path(
    post,
    path = "/v1/properties",
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Listing created", body = PropertyRecord),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "properties"
)]
pub(crate) async fn create_property(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreatePropertyRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<PropertyRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let now = Utc::now();
    let id = PropertyId::new();

    let record = PropertyRecord {
        id,
        slug: make_slug(&req.title, &id),
        title: req.title,
        description: req.description,
        listing_type: req.listing_type,
        category: req.category,
        price: req.price,
        monthly_fee: req.monthly_fee,
        location: req.location,
        specs: req.specs,
        interior_features: req.interior_features,
        exterior_features: req.exterior_features,
        building_features: req.building_features,
        property_details: req.property_details,
        media: req.media,
        status: req.status.unwrap_or(PropertyStatus::Active),
        view_count: 0,
        created_at: now,
        updated_at: now,
    };

    state.properties.insert(record.clone());

    // Write-through. Failure is surfaced because the in-memory record
    // would be lost on restart, causing silent data loss.
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::properties::insert(pool, &record).await {
            tracing::error!(property_id = %record.id, error = %e, "failed to persist property");
            return Err(AppError::Internal(
                "listing created in-memory but database persist failed".to_string(),
            ));
        }
    }

    audit::record(
        &state,
        &caller.username,
        "create",
        "property",
        record.id,
        serde_json::json!({"title": record.title, "listing_type": record.listing_type}),
    )
    .await;

    Ok((axum::http::StatusCode::CREATED, Json(record)))
}

/// PUT /v1/properties/:id — Partially update a listing.
#[utoipa::path(
    put,
    path = "/v1/properties/{id}",
    params(("id" = Uuid, Path, description = "Property ID")),
    request_body = UpdatePropertyRequest,
    responses(
        (status = 200, description = "Listing updated", body = PropertyRecord),
        (status = 404, description = "Listing not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "properties"
)]
pub(crate) async fn update_property(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdatePropertyRequest>, JsonRejection>,
) -> Result<Json<PropertyRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let id = PropertyId::from_uuid(id);

    let mut changed: Vec<&'static str> = Vec::new();
    let record = state
        .properties
        .update(&id, |p| {
            if let Some(title) = req.title {
                p.title = title;
                changed.push("title");
            }
            if let Some(description) = req.description {
                p.description = description;
                changed.push("description");
            }
            if let Some(category) = req.category {
                p.category = category;
                changed.push("category");
            }
            if let Some(price) = req.price {
                p.price = price;
                changed.push("price");
            }
            if let Some(fee) = req.monthly_fee {
                p.monthly_fee = Some(fee);
                changed.push("monthly_fee");
            }
            if let Some(location) = req.location {
                p.location = location;
                changed.push("location");
            }
            if let Some(specs) = req.specs {
                p.specs = specs;
                changed.push("specs");
            }
            if let Some(interior) = req.interior_features {
                p.interior_features = interior;
                changed.push("interior_features");
            }
            if let Some(exterior) = req.exterior_features {
                p.exterior_features = exterior;
                changed.push("exterior_features");
            }
            if let Some(building) = req.building_features {
                p.building_features = building;
                changed.push("building_features");
            }
            if let Some(details) = req.property_details {
                p.property_details = Some(details);
                changed.push("property_details");
            }
            if let Some(media) = req.media {
                p.media = media;
                changed.push("media");
            }
            if let Some(status) = req.status {
                p.status = status;
                changed.push("status");
            }
            p.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound(format!("property {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::properties::update(pool, &record).await {
            tracing::error!(property_id = %id, error = %e, "failed to persist property update");
            return Err(AppError::Internal(
                "listing updated in-memory but database persist failed".to_string(),
            ));
        }
    }

    audit::record(
        &state,
        &caller.username,
        "update",
        "property",
        id,
        serde_json::json!({"changed": changed}),
    )
    .await;

    Ok(Json(record))
}

/// DELETE /v1/properties/:id — Hard delete a listing.
///
/// Cascades image deletion through the CDN client when configured. CDN
/// failures are logged and audited but do not resurrect the listing.
#[utoipa::path(
    delete,
    path = "/v1/properties/{id}",
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 404, description = "Listing not found", body = crate::error::ErrorBody),
    ),
    tag = "properties"
)]
pub(crate) async fn delete_property(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, AppError> {
    let id = PropertyId::from_uuid(id);
    let record = state
        .properties
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("property {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::properties::delete(pool, &id).await {
            tracing::error!(property_id = %id, error = %e, "failed to delete property row");
            return Err(AppError::Internal(
                "listing removed in-memory but database delete failed".to_string(),
            ));
        }
    }

    let mut images_deleted = 0usize;
    if !record.media.images.is_empty() {
        match &state.media_client {
            Some(client) => {
                images_deleted = client.delete_images(&record.media.images).await;
            }
            None => {
                tracing::warn!(
                    property_id = %id,
                    images = record.media.images.len(),
                    "no CDN client configured — listing images were not removed"
                );
            }
        }
    }

    audit::record(
        &state,
        &caller.username,
        "delete",
        "property",
        id,
        serde_json::json!({
            "title": record.title,
            "images": record.media.images.len(),
            "images_deleted": images_deleted,
        }),
    )
    .await;

    Ok(axum::http::StatusCode::NO_CONTENT)
}
